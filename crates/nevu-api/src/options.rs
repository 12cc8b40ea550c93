pub mod client;
pub mod error;

pub use client::OptionsClient;
pub use error::BackendError;
