//! Where the play and auto-next actions lead.

use std::time::Duration;

use url::form_urlencoded;

use crate::models::{MediaItem, MediaType};
use crate::watch::resume_offset;

/// Length of the auto-next countdown shown when credits start.
pub fn countdown_duration(item: &MediaItem) -> Duration {
    if item.item_type == MediaType::Movie {
        Duration::from_secs(10)
    } else {
        Duration::from_secs(3)
    }
}

/// Destination of the auto-next button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextTarget {
    /// Leave a finished movie for its detail screen.
    SkipCredits { section: u64, rating_key: String },
    /// Play the next queue entry from the start.
    NextEpisode { rating_key: String },
    /// Last episode in the queue: back to the show's episode list.
    ReturnToShow {
        section: u64,
        show: String,
        season: String,
        episode: String,
    },
}

impl NextTarget {
    /// Resolve the target for `current`, given the play queue (current first).
    pub fn resolve(current: &MediaItem, queue: &[MediaItem]) -> Option<Self> {
        let section = current.library_section_id.unwrap_or_default();
        if current.item_type == MediaType::Movie {
            return Some(Self::SkipCredits {
                section,
                rating_key: current.rating_key.clone(),
            });
        }
        if let Some(next) = queue.get(1) {
            return Some(Self::NextEpisode {
                rating_key: next.rating_key.clone(),
            });
        }
        Some(Self::ReturnToShow {
            section,
            show: current.grandparent_rating_key.clone()?,
            season: current.parent_rating_key.clone()?,
            episode: current.rating_key.clone(),
        })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::SkipCredits { .. } => "Skip Credits",
            Self::NextEpisode { .. } => "Next Episode",
            Self::ReturnToShow { .. } => "Return to Show",
        }
    }

    /// Client route for this target.
    pub fn route(&self) -> String {
        match self {
            Self::SkipCredits {
                section,
                rating_key,
            } => browse_route(*section, &[("mid", rating_key)]),
            Self::NextEpisode { rating_key } => format!("/watch/{rating_key}?t=0"),
            Self::ReturnToShow {
                section,
                show,
                season,
                episode,
            } => browse_route(*section, &[("mid", show), ("pid", season), ("iid", episode)]),
        }
    }
}

/// What the play button does for an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayTarget {
    /// Start playback, resuming at the offset (ms) if any.
    Watch {
        rating_key: String,
        offset: Option<u64>,
    },
    /// Shows need their detail (on-deck episode or first season) first.
    ShowDetail { rating_key: String },
    Unplayable,
}

impl PlayTarget {
    pub fn for_item(item: &MediaItem) -> Self {
        match item.item_type {
            MediaType::Movie | MediaType::Episode => Self::watch(item),
            MediaType::Show => Self::ShowDetail {
                rating_key: item.rating_key.clone(),
            },
            _ => Self::Unplayable,
        }
    }

    pub fn watch(item: &MediaItem) -> Self {
        Self::Watch {
            rating_key: item.rating_key.clone(),
            offset: resume_offset(item),
        }
    }

    /// Client route, `None` unless this is a `Watch` target.
    pub fn route(&self) -> Option<String> {
        match self {
            Self::Watch {
                rating_key,
                offset: Some(t),
            } => Some(format!("/watch/{rating_key}?t={t}")),
            Self::Watch { rating_key, .. } => Some(format!("/watch/{rating_key}")),
            _ => None,
        }
    }
}

fn browse_route(section: u64, params: &[(&str, &String)]) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())))
        .finish();
    format!("/browse/{section}?{query}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn episode(key: &str) -> MediaItem {
        MediaItem {
            rating_key: key.into(),
            item_type: MediaType::Episode,
            library_section_id: Some(2),
            parent_rating_key: Some("s1".into()),
            grandparent_rating_key: Some("show".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_movie_skips_credits() {
        let movie = MediaItem {
            rating_key: "42".into(),
            item_type: MediaType::Movie,
            library_section_id: Some(1),
            ..Default::default()
        };
        let target = NextTarget::resolve(&movie, &[]).unwrap();
        assert_eq!(target.route(), "/browse/1?mid=42");
        assert_eq!(countdown_duration(&movie), Duration::from_secs(10));
    }

    #[test]
    fn test_next_episode_and_return() {
        let current = episode("e1");
        let queue = vec![current.clone(), episode("e2")];
        let next = NextTarget::resolve(&current, &queue).unwrap();
        assert_eq!(next.route(), "/watch/e2?t=0");
        assert_eq!(next.label(), "Next Episode");

        let back = NextTarget::resolve(&current, &queue[..1]).unwrap();
        assert_eq!(back.route(), "/browse/2?mid=show&pid=s1&iid=e1");
        assert_eq!(countdown_duration(&current), Duration::from_secs(3));
    }

    #[test]
    fn test_play_target() {
        let mut ep = episode("e1");
        ep.view_offset = Some(5000);
        assert_eq!(PlayTarget::for_item(&ep).route().as_deref(), Some("/watch/e1?t=5000"));

        let show = MediaItem {
            rating_key: "s".into(),
            item_type: MediaType::Show,
            ..Default::default()
        };
        assert_eq!(
            PlayTarget::for_item(&show),
            PlayTarget::ShowDetail { rating_key: "s".into() }
        );
        assert_eq!(PlayTarget::for_item(&MediaItem::default()), PlayTarget::Unplayable);
    }
}
