//! Watched-state and rating transitions applied to items before the server
//! is told about them.

use crate::models::{MediaItem, MediaType};

/// Rating value that clears a user rating on the server.
pub const CLEAR_RATING: f32 = -1.0;

/// Whether the item counts as watched for the toggle buttons.
///
/// Movies and episodes are watched once played; a show only when every
/// episode has been played.
pub fn is_watched(item: &MediaItem) -> bool {
    match item.item_type {
        MediaType::Movie | MediaType::Episode => item.view_count > 0,
        MediaType::Show => item.viewed_leaf_count == item.leaf_count,
        _ => false,
    }
}

/// Flip the watched state of `item` in place.
///
/// Returns the played flag to send to the server, or `None` for item types
/// that cannot be toggled. An episode that was stopped part-way is always
/// marked watched rather than flipped.
pub fn toggle_watched(item: &mut MediaItem) -> Option<bool> {
    match item.item_type {
        MediaType::Movie | MediaType::Episode => {
            let in_progress = item.item_type == MediaType::Episode
                && item
                    .view_offset
                    .is_some_and(|offset| offset > 0 && offset < item.duration);
            item.view_count = if in_progress || item.view_count == 0 { 1 } else { 0 };
            Some(item.view_count > 0)
        }
        MediaType::Show => {
            item.viewed_leaf_count = if item.viewed_leaf_count == item.leaf_count {
                0
            } else {
                item.leaf_count
            };
            Some(item.viewed_leaf_count == item.leaf_count)
        }
        _ => None,
    }
}

/// Convert a 0.5-5 star rating to the server's 0-10 scale.
pub fn stars_to_rating(stars: f32) -> f32 {
    (stars.clamp(0.0, 5.0) * 2.0).round()
}

/// Convert a server rating to stars, `None` when unrated.
pub fn rating_to_stars(rating: Option<f32>) -> Option<f32> {
    rating.filter(|r| *r > 0.0).map(|r| r / 2.0)
}

/// Season shown first on a show's detail screen.
///
/// The on-deck episode's season wins; otherwise the lowest season index with
/// specials (index 0) sorted last; otherwise season 1.
pub fn default_season(seasons: &[MediaItem], on_deck_parent_index: Option<i32>) -> i32 {
    if let Some(index) = on_deck_parent_index {
        return index;
    }
    seasons
        .iter()
        .map(|s| s.index)
        .min_by_key(|index| (*index == 0, *index))
        .unwrap_or(1)
}

/// Offset (ms) to resume playback from, if the item was partially watched.
pub fn resume_offset(item: &MediaItem) -> Option<u64> {
    item.view_offset.filter(|o| *o > 0)
}
