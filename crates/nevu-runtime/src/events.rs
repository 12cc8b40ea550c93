//! Change notifications fanned out to every subscriber.

use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 16;

/// Emitted once per confirmed watchlist change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchlistEvent {
    Updated { len: usize },
}

pub(crate) fn channel() -> broadcast::Sender<WatchlistEvent> {
    broadcast::channel(CHANNEL_CAPACITY).0
}
