//! Service seams the runtime stores are generic over.
//!
//! The concrete clients in this crate implement these; tests substitute
//! in-memory fakes.

use std::future::Future;

use nevu_core::models::{Directory, MediaContainer, MediaItem, UserData, UserOption};

/// The user's cloud watchlist.
pub trait WatchlistService: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch the full watchlist, newest first.
    fn get_watchlist(&self)
        -> impl Future<Output = Result<Vec<MediaItem>, Self::Error>> + Send;

    /// Add an item by its discover id (see [`MediaItem::discover_id`]).
    fn add_to_watchlist(
        &self,
        discover_id: &str,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Remove an item by its discover id.
    fn remove_from_watchlist(
        &self,
        discover_id: &str,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Remote key-value store holding the user's preferences.
pub trait SettingsBackend: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn fetch_options(&self)
        -> impl Future<Output = Result<Vec<UserOption>, Self::Error>> + Send;

    fn upsert_option(
        &self,
        key: &str,
        value: &str,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// The plex.tv account behind the session.
pub trait AccountService: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn get_logged_in_user(&self) -> impl Future<Output = Result<UserData, Self::Error>> + Send;
}

/// Library reads and writes against a media server.
pub trait MediaServer: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn get_all_libraries(&self)
        -> impl Future<Output = Result<Vec<Directory>, Self::Error>> + Send;

    /// A section's own container (title, available types).
    fn get_library(
        &self,
        section: &str,
    ) -> impl Future<Output = Result<MediaContainer, Self::Error>> + Send;

    /// Any listing path plus query pairs, e.g. a filtered section listing.
    fn get_library_dir(
        &self,
        dir: &str,
        params: &[(String, String)],
    ) -> impl Future<Output = Result<MediaContainer, Self::Error>> + Send;

    /// Secondary directories of a section, e.g. `genre`.
    fn get_library_secondary(
        &self,
        section: &str,
        kind: &str,
    ) -> impl Future<Output = Result<Vec<Directory>, Self::Error>> + Send;

    /// Items under `/library{path}`.
    fn get_library_media(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<Vec<MediaItem>, Self::Error>> + Send;

    /// Full metadata (children, on-deck, extras) for one item.
    fn get_library_meta(
        &self,
        rating_key: &str,
    ) -> impl Future<Output = Result<MediaItem, Self::Error>> + Send;

    fn get_library_meta_children(
        &self,
        rating_key: &str,
    ) -> impl Future<Output = Result<Vec<MediaItem>, Self::Error>> + Send;

    /// The local copy of a cloud item, `None` if this server lacks it.
    fn get_item_by_guid(
        &self,
        guid: &str,
    ) -> impl Future<Output = Result<Option<MediaItem>, Self::Error>> + Send;

    fn set_media_played_status(
        &self,
        played: bool,
        rating_key: &str,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    fn set_media_rating(
        &self,
        rating: f32,
        rating_key: &str,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
