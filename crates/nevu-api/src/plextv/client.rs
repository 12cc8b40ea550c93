use reqwest::Client;

use nevu_core::models::{ContainerResponse, MediaItem, UserData};

use super::error::PlexTvError;
use crate::traits::{AccountService, WatchlistService};

const DISCOVER_URL: &str = "https://discover.provider.plex.tv";
const PLEX_TV_URL: &str = "https://plex.tv/api/v2";

/// Watchlist page size; the discover service caps a single page at 300.
const WATCHLIST_PAGE_SIZE: &str = "300";

/// plex.tv account and discover watchlist client.
pub struct PlexTvClient {
    account_token: String,
    client_id: String,
    http: Client,
}

impl PlexTvClient {
    pub fn new(account_token: String, client_id: String) -> Self {
        Self {
            account_token,
            client_id,
            http: Client::new(),
        }
    }

    async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, PlexTvError> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            if status == 401 {
                return Err(PlexTvError::Auth(body));
            }
            Err(PlexTvError::Api {
                status,
                message: body,
            })
        }
    }

    async fn watchlist_action(&self, action: &str, discover_id: &str) -> Result<(), PlexTvError> {
        tracing::debug!(action, discover_id, "discover watchlist action");
        let resp = self
            .http
            .put(format!("{DISCOVER_URL}/actions/{action}"))
            .header("X-Plex-Token", &self.account_token)
            .header("Accept", "application/json")
            .query(&[("ratingKey", discover_id)])
            .send()
            .await?;

        Self::check_response(resp).await?;
        Ok(())
    }
}

impl WatchlistService for PlexTvClient {
    type Error = PlexTvError;

    async fn get_watchlist(&self) -> Result<Vec<MediaItem>, PlexTvError> {
        tracing::debug!("fetching discover watchlist");
        let resp = self
            .http
            .get(format!("{DISCOVER_URL}/library/sections/watchlist/all"))
            .header("Accept", "application/json")
            .query(&[
                ("X-Plex-Token", self.account_token.as_str()),
                ("includeAdvanced", "1"),
                ("includeMeta", "1"),
                ("X-Plex-Container-Start", "0"),
                ("X-Plex-Container-Size", WATCHLIST_PAGE_SIZE),
            ])
            .send()
            .await?;

        let resp = Self::check_response(resp).await?;
        let body: ContainerResponse = resp
            .json()
            .await
            .map_err(|e| PlexTvError::Parse(e.to_string()))?;
        Ok(body.media_container.metadata)
    }

    async fn add_to_watchlist(&self, discover_id: &str) -> Result<(), PlexTvError> {
        self.watchlist_action("addToWatchlist", discover_id).await
    }

    async fn remove_from_watchlist(&self, discover_id: &str) -> Result<(), PlexTvError> {
        self.watchlist_action("removeFromWatchlist", discover_id)
            .await
    }
}

impl AccountService for PlexTvClient {
    type Error = PlexTvError;

    async fn get_logged_in_user(&self) -> Result<UserData, PlexTvError> {
        let resp = self
            .http
            .get(format!("{PLEX_TV_URL}/user"))
            .header("X-Plex-Token", &self.account_token)
            .header("X-Plex-Client-Identifier", &self.client_id)
            .header("Accept", "application/json")
            .send()
            .await?;

        let resp = Self::check_response(resp).await?;
        resp.json::<UserData>()
            .await
            .map_err(|e| PlexTvError::Parse(e.to_string()))
    }
}
