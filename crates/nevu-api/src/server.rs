pub mod client;
pub mod error;
pub mod proxy;

pub use client::{PlexServerClient, ServerSession};
pub use error::PlexError;
