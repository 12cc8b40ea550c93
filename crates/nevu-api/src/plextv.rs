pub mod client;
pub mod error;

pub use client::PlexTvClient;
pub use error::PlexTvError;
