use std::collections::HashSet;

use tokio::sync::{broadcast, RwLock};

use nevu_api::traits::WatchlistService;
use nevu_core::models::{discover_id_of, MediaItem};

use crate::events::{self, WatchlistEvent};

/// In-memory mirror of the remote watchlist.
///
/// Mutations are confirm-then-commit: the local list changes only after the
/// remote call succeeds. Remote failures are logged and leave the list as it
/// was.
pub struct WatchlistCache<S> {
    service: S,
    items: RwLock<Vec<MediaItem>>,
    events: broadcast::Sender<WatchlistEvent>,
}

impl<S: WatchlistService> WatchlistCache<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            items: RwLock::new(Vec::new()),
            events: events::channel(),
        }
    }

    /// Replace the cache with the full remote watchlist.
    pub async fn load(&self) {
        match self.service.get_watchlist().await {
            Ok(items) => {
                tracing::debug!(count = items.len(), "watchlist loaded");
                *self.items.write().await = dedupe_by_guid(items);
            }
            Err(e) => tracing::warn!("Failed to load watchlist: {e}"),
        }
    }

    pub async fn is_on_watchlist(&self, guid: &str) -> bool {
        self.items.read().await.iter().any(|i| i.guid == guid)
    }

    /// Add `item` to the front of the watchlist.
    pub async fn add_item(&self, item: MediaItem) {
        if self.is_on_watchlist(&item.guid).await {
            return;
        }
        let Some(discover_id) = item.discover_id() else {
            tracing::warn!(guid = %item.guid, "no discover id, not adding to watchlist");
            return;
        };

        if let Err(e) = self.service.add_to_watchlist(discover_id).await {
            tracing::warn!(guid = %item.guid, "Failed to add to watchlist: {e}");
            return;
        }

        let len = {
            let mut items = self.items.write().await;
            if items.iter().any(|i| i.guid == item.guid) {
                return;
            }
            items.insert(0, item);
            items.len()
        };
        let _ = self.events.send(WatchlistEvent::Updated { len });
    }

    /// Remove the item with `guid`. Nothing is sent if it is not cached.
    pub async fn remove_item(&self, guid: &str) {
        if !self.is_on_watchlist(guid).await {
            return;
        }
        let Some(discover_id) = discover_id_of(guid) else {
            tracing::warn!(guid, "no discover id, not removing from watchlist");
            return;
        };

        if let Err(e) = self.service.remove_from_watchlist(discover_id).await {
            tracing::warn!(guid, "Failed to remove from watchlist: {e}");
            return;
        }

        let len = {
            let mut items = self.items.write().await;
            items.retain(|i| i.guid != guid);
            items.len()
        };
        let _ = self.events.send(WatchlistEvent::Updated { len });
    }

    pub async fn items(&self) -> Vec<MediaItem> {
        self.items.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    /// Replace the cached list without contacting the service.
    pub async fn set_items(&self, items: Vec<MediaItem>) {
        *self.items.write().await = dedupe_by_guid(items);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WatchlistEvent> {
        self.events.subscribe()
    }
}

/// Keep the first item for each GUID, preserving order.
fn dedupe_by_guid(mut items: Vec<MediaItem>) -> Vec<MediaItem> {
    let mut seen = HashSet::new();
    items.retain(|i| seen.insert(i.guid.clone()));
    items
}
