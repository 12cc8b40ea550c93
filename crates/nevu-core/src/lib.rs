//! Domain types and client-side logic shared by the Nevu crates.
//!
//! Nothing in here talks to the network: remote calls live in `nevu-api`,
//! the stateful stores that combine both live in `nevu-runtime`.

pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod playback;
pub mod sort;
pub mod storage;
pub mod watch;
