//! HTTP clients for the services a Nevu session talks to.
//!
//! - [`server`]: the Plex Media Server, reached through the backend's proxy.
//! - [`plextv`]: plex.tv account and the discover watchlist.
//! - [`community`]: ratings and reviews from the community GraphQL API.
//! - [`options`]: per-user options stored by the Nevu backend.
//!
//! Clients are stateless: each call is one request, parsed JSON or an error.

pub mod community;
pub mod options;
pub mod plextv;
pub mod server;
pub mod traits;
