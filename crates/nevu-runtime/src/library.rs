//! Library actions that combine server calls with the item rules in
//! `nevu_core`.

use nevu_api::traits::MediaServer;
use nevu_core::error::NevuError;
use nevu_core::filter::{BrowseQuery, PrimaryFilter, TypeFilter};
use nevu_core::models::{MediaContainer, MediaItem};
use nevu_core::playback::PlayTarget;
use nevu_core::sort::{sort_metadata, LibrarySort};
use nevu_core::watch::{self, CLEAR_RATING};

/// List a section with the given browse selections.
pub async fn browse<M: MediaServer>(
    server: &M,
    section_id: u64,
    primary: PrimaryFilter,
    type_filter: TypeFilter,
    sort: LibrarySort,
) -> Result<MediaContainer, M::Error> {
    let section = server.get_library(&section_id.to_string()).await?;
    let query = BrowseQuery::build(section_id, section.primary_type(), primary, type_filter, sort);
    tracing::debug!(path = %query.path, ?sort, "browsing section");

    let mut container = server.get_library_dir(&query.path, &query.params).await?;
    if sort == LibrarySort::Random {
        sort_metadata(&mut container.metadata, sort);
    } else {
        query.post_sort(&mut container);
    }
    Ok(container)
}

/// The server's own copy of a cloud item (e.g. a watchlist entry).
pub async fn resolve_local<M: MediaServer>(server: &M, item: &MediaItem) -> Result<MediaItem, NevuError> {
    server
        .get_item_by_guid(&item.guid)
        .await
        .map_err(|e| NevuError::Api(e.to_string()))?
        .ok_or_else(|| NevuError::NotOnServer(item.title.clone()))
}

/// Work out what the play button starts.
///
/// Shows resolve to their on-deck episode, or the first episode of the
/// default season.
pub async fn resolve_play<M: MediaServer>(server: &M, item: &MediaItem) -> Result<PlayTarget, M::Error> {
    let PlayTarget::ShowDetail { rating_key } = PlayTarget::for_item(item) else {
        return Ok(PlayTarget::for_item(item));
    };

    let show = server.get_library_meta(&rating_key).await?;
    if let Some(on_deck) = show.on_deck_item() {
        return Ok(PlayTarget::watch(on_deck));
    }

    let seasons = match show.child_items() {
        [] => server.get_library_meta_children(&rating_key).await?,
        seasons => seasons.to_vec(),
    };
    let index = watch::default_season(&seasons, None);
    let Some(season) = seasons.iter().find(|s| s.index == index) else {
        return Ok(PlayTarget::Unplayable);
    };

    let episodes = server.get_library_meta_children(&season.rating_key).await?;
    Ok(episodes
        .first()
        .map(PlayTarget::watch)
        .unwrap_or(PlayTarget::Unplayable))
}

/// Flip the watched state of `item` and tell the server.
///
/// Returns the new played flag, `None` if the item type has no watched state.
pub async fn toggle_watched<M: MediaServer>(
    server: &M,
    item: &mut MediaItem,
) -> Result<Option<bool>, M::Error> {
    let Some(played) = watch::toggle_watched(item) else {
        return Ok(None);
    };
    server
        .set_media_played_status(played, &item.rating_key)
        .await?;
    Ok(Some(played))
}

/// Rate an item in stars (0.5-5); `None` clears the rating.
pub async fn rate<M: MediaServer>(
    server: &M,
    rating_key: &str,
    stars: Option<f32>,
) -> Result<(), M::Error> {
    let rating = stars.map(watch::stars_to_rating).unwrap_or(CLEAR_RATING);
    server.set_media_rating(rating, rating_key).await
}

#[cfg(test)]
mod tests {
    use nevu_core::models::{ChildContainer, LibraryType, MediaType, OnDeck};

    use super::*;
    use crate::home::tests::FakeServer;

    fn item(rating_key: &str, item_type: MediaType) -> MediaItem {
        MediaItem {
            rating_key: rating_key.into(),
            item_type,
            ..Default::default()
        }
    }

    fn show_section() -> MediaContainer {
        MediaContainer {
            types: vec![LibraryType {
                key: "/library/sections/2/all?type=2".into(),
                type_name: "show".into(),
                title: "TV Shows".into(),
            }],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_browse_show_section_updated_sort() {
        let mut server = FakeServer::default();
        server.sections.insert("2".into(), show_section());
        server.listing = vec![
            MediaItem {
                updated_at: 5,
                ..item("a", MediaType::Show)
            },
            MediaItem {
                updated_at: 100,
                ..item("b", MediaType::Show)
            },
            MediaItem {
                updated_at: 20,
                ..item("c", MediaType::Show)
            },
        ];

        let container = browse(
            &server,
            2,
            PrimaryFilter::All,
            TypeFilter::Any,
            LibrarySort::UpdatedDesc,
        )
        .await
        .unwrap();

        let keys: Vec<_> = container.metadata.iter().map(|i| i.rating_key.as_str()).collect();
        assert_eq!(keys, vec!["b", "c", "a"]);

        let calls = server.dir_calls.lock().unwrap();
        assert_eq!(calls[0].0, "/library/sections/2/all");
        assert!(calls[0]
            .1
            .contains(&("sort".to_string(), "title:asc".to_string())));
    }

    #[tokio::test]
    async fn test_resolve_local_not_on_server() {
        let mut server = FakeServer::default();
        let cloud = MediaItem {
            guid: "plex://movie/5d77".into(),
            title: "Arrival".into(),
            ..Default::default()
        };

        let err = resolve_local(&server, &cloud).await.unwrap_err();
        assert!(matches!(err, NevuError::NotOnServer(ref t) if t == "Arrival"));
        assert_eq!(
            err.to_string(),
            "\"Arrival\" is not available on this Plex Server"
        );

        server
            .by_guid
            .insert(cloud.guid.clone(), item("77", MediaType::Movie));
        assert_eq!(resolve_local(&server, &cloud).await.unwrap().rating_key, "77");
    }

    #[tokio::test]
    async fn test_play_movie_resumes() {
        let server = FakeServer::default();
        let movie = MediaItem {
            view_offset: Some(60_000),
            ..item("9", MediaType::Movie)
        };
        assert_eq!(
            resolve_play(&server, &movie).await.unwrap(),
            PlayTarget::Watch {
                rating_key: "9".into(),
                offset: Some(60_000)
            }
        );
    }

    #[tokio::test]
    async fn test_play_show_prefers_on_deck() {
        let mut server = FakeServer::default();
        server.meta.insert(
            "10".into(),
            MediaItem {
                on_deck: Some(OnDeck {
                    metadata: Some(Box::new(item("13", MediaType::Episode))),
                }),
                ..item("10", MediaType::Show)
            },
        );
        let target = resolve_play(&server, &item("10", MediaType::Show)).await.unwrap();
        assert_eq!(
            target,
            PlayTarget::Watch {
                rating_key: "13".into(),
                offset: None
            }
        );
    }

    #[tokio::test]
    async fn test_play_show_first_episode_of_first_season() {
        let mut server = FakeServer::default();
        let specials = MediaItem {
            index: 0,
            ..item("s0", MediaType::Season)
        };
        let season_one = MediaItem {
            index: 1,
            ..item("s1", MediaType::Season)
        };
        server.meta.insert(
            "10".into(),
            MediaItem {
                children: Some(ChildContainer {
                    size: 2,
                    metadata: vec![specials, season_one],
                }),
                ..item("10", MediaType::Show)
            },
        );
        server.children.insert(
            "s1".into(),
            vec![item("e1", MediaType::Episode), item("e2", MediaType::Episode)],
        );

        let target = resolve_play(&server, &item("10", MediaType::Show)).await.unwrap();
        assert_eq!(target.route().as_deref(), Some("/watch/e1"));
    }

    #[tokio::test]
    async fn test_toggle_and_rate_send_to_server() {
        let server = FakeServer::default();
        let mut movie = item("9", MediaType::Movie);

        assert_eq!(toggle_watched(&server, &mut movie).await.unwrap(), Some(true));
        assert_eq!(toggle_watched(&server, &mut movie).await.unwrap(), Some(false));
        let mut season = item("s", MediaType::Season);
        assert_eq!(toggle_watched(&server, &mut season).await.unwrap(), None);

        rate(&server, "9", Some(3.5)).await.unwrap();
        rate(&server, "9", None).await.unwrap();

        assert_eq!(
            *server.played.lock().unwrap(),
            vec![(true, "9".to_string()), (false, "9".to_string())]
        );
        assert_eq!(
            *server.rated.lock().unwrap(),
            vec![(7.0, "9".to_string()), (CLEAR_RATING, "9".to_string())]
        );
    }
}
