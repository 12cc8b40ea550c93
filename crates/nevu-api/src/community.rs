pub mod client;
pub mod error;
pub mod types;

pub use client::CommunityClient;
pub use error::CommunityError;
