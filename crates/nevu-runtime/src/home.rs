//! Home screen content: random genre shelves and a featured item.

use futures::future::join_all;
use rand::seq::{IndexedRandom, SliceRandom};
use serde::Serialize;

use nevu_api::traits::MediaServer;
use nevu_core::models::{Directory, MediaItem};

pub const GENRES_PER_LIBRARY: usize = 5;
pub const RANDOM_ITEM_ATTEMPTS: usize = 15;

/// One horizontal row on the home screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Shelf {
    pub title: String,
    pub library_id: String,
    /// Listing path, also used as the shelf's browse link.
    pub dir: String,
}

/// Up to [`GENRES_PER_LIBRARY`] random genre shelves per movie or show
/// library, in random order.
pub async fn recommendation_shelves<M: MediaServer>(
    server: &M,
    libraries: &[Directory],
) -> Vec<Shelf> {
    let video: Vec<&Directory> = libraries.iter().filter(|l| l.is_video_library()).collect();
    let listings = join_all(
        video
            .iter()
            .map(|&library| server.get_library_secondary(&library.key, "genre")),
    )
    .await;

    let mut shelves = Vec::new();
    for (library, genres) in video.into_iter().zip(listings) {
        let genres = match genres {
            Ok(genres) => genres,
            Err(e) => {
                tracing::warn!(library = %library.title, "Failed to list genres: {e}");
                continue;
            }
        };

        let picked: Vec<&Directory> = genres
            .choose_multiple(&mut rand::rng(), GENRES_PER_LIBRARY)
            .collect();
        shelves.extend(picked.into_iter().map(|genre| Shelf {
            title: format!("{} - {}", library.title, genre.title),
            library_id: library.key.clone(),
            dir: format!("/library/sections/{}/genre/{}", library.key, genre.key),
        }));
    }

    shelves.shuffle(&mut rand::rng());
    shelves
}

/// One random item from a random genre of a random movie or show library,
/// with full metadata. Empty picks are retried.
pub async fn random_item<M: MediaServer>(server: &M, libraries: &[Directory]) -> Option<MediaItem> {
    let candidates: Vec<&Directory> = libraries.iter().filter(|l| l.is_video_library()).collect();
    if candidates.is_empty() {
        return None;
    }

    for attempt in 0..=RANDOM_ITEM_ATTEMPTS {
        if let Some(item) = pick_random(server, &candidates).await {
            return match server.get_library_meta(&item.rating_key).await {
                Ok(full) => Some(full),
                Err(e) => {
                    tracing::warn!(rating_key = %item.rating_key, "Failed to load featured item: {e}");
                    None
                }
            };
        }
        tracing::debug!(attempt, "random pick came back empty");
    }
    None
}

async fn pick_random<M: MediaServer>(server: &M, libraries: &[&Directory]) -> Option<MediaItem> {
    let library = *libraries.choose(&mut rand::rng())?;

    let genres = server
        .get_library_secondary(&library.key, "genre")
        .await
        .map_err(|e| tracing::warn!(library = %library.title, "Failed to list genres: {e}"))
        .ok()?;
    let genre = genres.choose(&mut rand::rng())?;

    let mut items = server
        .get_library_media(&format!("/sections/{}/all?genre={}", library.key, genre.key))
        .await
        .map_err(|e| tracing::warn!(library = %library.title, "Failed to list genre items: {e}"))
        .ok()?;

    if items.is_empty() {
        return None;
    }
    let index = rand::random_range(0..items.len());
    Some(items.swap_remove(index))
}
