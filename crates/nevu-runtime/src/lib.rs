//! Per-login session state for the Nevu client.
//!
//! A [`Runtime`] is built once the user has an account token and a server.
//! It owns the API clients and the three stores (watchlist, settings,
//! account), and is dropped on logout.

mod db;
pub mod events;
pub mod home;
pub mod library;
pub mod session;
pub mod settings;
pub mod timers;
pub mod watchlist;

use nevu_api::community::types::ReviewsData;
use nevu_api::community::CommunityClient;
use nevu_api::options::OptionsClient;
use nevu_api::plextv::PlexTvClient;
use nevu_api::server::{PlexServerClient, ServerSession};
use nevu_api::traits::MediaServer;
use nevu_core::config::AppConfig;
use nevu_core::error::NevuError;
use nevu_core::filter::{PrimaryFilter, TypeFilter};
use nevu_core::models::{Directory, MediaContainer, MediaItem};
use nevu_core::playback::{countdown_duration, NextTarget, PlayTarget};
use nevu_core::sort::LibrarySort;
use nevu_core::storage::{keys, ClientIdentity};

pub use db::StorageHandle;
pub use events::WatchlistEvent;
pub use home::Shelf;
pub use session::SessionStore;
pub use settings::SettingsStore;
pub use timers::{Countdown, DelayedTask};
pub use watchlist::WatchlistCache;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("config error: {0}")]
    Config(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("api error: {0}")]
    Api(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("not logged in")]
    NotLoggedIn,
}

fn storage_err(e: NevuError) -> RuntimeError {
    RuntimeError::Storage(e.to_string())
}

fn api_err(e: impl std::error::Error) -> RuntimeError {
    RuntimeError::Api(e.to_string())
}

/// What `nevu login` stores.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub account_token: String,
    pub server_url: String,
    /// Token for the media server; owners can reuse the account token.
    pub server_token: Option<String>,
}

/// Persist credentials for the next [`Runtime::new`].
pub async fn login(storage: &StorageHandle, credentials: &Credentials) -> Result<(), RuntimeError> {
    let server_url = credentials.server_url.trim_end_matches('/');
    url_check(server_url)?;
    storage
        .set(keys::ACCOUNT_TOKEN, credentials.account_token.as_str())
        .await
        .map_err(storage_err)?;
    storage
        .set(
            keys::SERVER_TOKEN,
            credentials
                .server_token
                .as_deref()
                .unwrap_or(credentials.account_token.as_str()),
        )
        .await
        .map_err(storage_err)?;
    storage
        .set(keys::SERVER, server_url)
        .await
        .map_err(storage_err)?;
    tracing::info!(server = server_url, "credentials saved");
    Ok(())
}

fn url_check(server_url: &str) -> Result<(), RuntimeError> {
    if server_url.starts_with("http://") || server_url.starts_with("https://") {
        Ok(())
    } else {
        Err(RuntimeError::Config(format!(
            "server URL must start with http:// or https://: {server_url}"
        )))
    }
}

/// Forget tokens and the selected server. The client id is kept.
pub async fn clear_credentials(storage: &StorageHandle) -> Result<(), RuntimeError> {
    for key in [keys::ACCOUNT_TOKEN, keys::SERVER_TOKEN, keys::SERVER] {
        storage.remove(key).await.map_err(storage_err)?;
    }
    Ok(())
}

pub struct Runtime {
    config: AppConfig,
    storage: StorageHandle,
    identity: ClientIdentity,
    server: PlexServerClient,
    community: CommunityClient,
    watchlist: WatchlistCache<PlexTvClient>,
    settings: SettingsStore<OptionsClient>,
    session: SessionStore<PlexTvClient>,
}

impl Runtime {
    /// Build the session from stored credentials. Nothing is fetched until
    /// [`Runtime::start`].
    pub async fn new(mut config: AppConfig, storage: StorageHandle) -> Result<Self, RuntimeError> {
        let flags = storage.feature_flags().await.map_err(storage_err)?;
        config.apply_stored_flags(&flags);

        let identity = storage.ensure_identity().await.map_err(storage_err)?;

        let account_token = storage
            .get(keys::ACCOUNT_TOKEN)
            .await
            .map_err(storage_err)?
            .filter(|t| !t.is_empty())
            .ok_or(RuntimeError::NotLoggedIn)?;

        let server_url = match storage.get(keys::SERVER).await.map_err(storage_err)? {
            Some(url) if !url.is_empty() => url,
            _ => config
                .server_url()
                .map(str::to_string)
                .ok_or_else(|| RuntimeError::Config("no server selected".into()))?,
        };
        let server_token = storage
            .get(keys::SERVER_TOKEN)
            .await
            .map_err(storage_err)?
            .unwrap_or_else(|| account_token.clone());

        let server = PlexServerClient::new(
            config.backend_url(),
            ServerSession {
                server_url,
                token: server_token,
                client_id: identity.client_id.clone(),
                session_id: identity.session_id.clone(),
                product: config.client.product.clone(),
            },
            config.features.disable_proxy,
        );

        Ok(Self {
            community: CommunityClient::new(account_token.clone()),
            watchlist: WatchlistCache::new(PlexTvClient::new(
                account_token.clone(),
                identity.client_id.clone(),
            )),
            settings: SettingsStore::new(OptionsClient::new(
                config.backend_url(),
                account_token.clone(),
            )),
            session: SessionStore::new(PlexTvClient::new(
                account_token,
                identity.client_id.clone(),
            )),
            server,
            identity,
            storage,
            config,
        })
    }

    /// Load the account, user options and watchlist concurrently.
    pub async fn start(&self) {
        tokio::join!(
            self.session.load_user(),
            self.settings.fetch_settings(),
            self.watchlist.load(),
        );
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    pub fn storage(&self) -> &StorageHandle {
        &self.storage
    }

    pub fn server(&self) -> &PlexServerClient {
        &self.server
    }

    pub fn watchlist(&self) -> &WatchlistCache<PlexTvClient> {
        &self.watchlist
    }

    pub fn settings(&self) -> &SettingsStore<OptionsClient> {
        &self.settings
    }

    pub fn session(&self) -> &SessionStore<PlexTvClient> {
        &self.session
    }

    pub async fn libraries(&self) -> Result<Vec<Directory>, RuntimeError> {
        self.server.get_all_libraries().await.map_err(api_err)
    }

    /// Browse a section. Unset selections fall back to the last ones used,
    /// and the effective selections are remembered.
    pub async fn browse(
        &self,
        section_id: u64,
        primary: Option<PrimaryFilter>,
        type_filter: Option<TypeFilter>,
        sort: Option<LibrarySort>,
    ) -> Result<MediaContainer, RuntimeError> {
        let primary = match primary {
            Some(p) => p,
            None => PrimaryFilter::from_stored(self.stored(keys::PRIMARY_FILTER).await.as_deref()),
        };
        let type_filter = match type_filter {
            Some(t) => t,
            None => TypeFilter::from_stored(self.stored(keys::TYPE_FILTER).await.as_deref()),
        };
        let sort = match sort {
            Some(s) => s,
            None => LibrarySort::from_stored(self.stored(keys::SORT_BY).await.as_deref()),
        };

        for (key, value) in [
            (keys::PRIMARY_FILTER, primary.as_str()),
            (keys::TYPE_FILTER, type_filter.as_str()),
            (keys::SORT_BY, sort.as_str()),
        ] {
            if let Err(e) = self.storage.set(key, value).await {
                tracing::warn!(key, "Failed to remember browse selection: {e}");
            }
        }

        library::browse(&self.server, section_id, primary, type_filter, sort)
            .await
            .map_err(api_err)
    }

    async fn stored(&self, key: &str) -> Option<String> {
        self.storage
            .get(key)
            .await
            .map_err(|e| tracing::warn!(key, "Failed to read storage: {e}"))
            .ok()
            .flatten()
    }

    pub async fn meta(&self, rating_key: &str) -> Result<MediaItem, RuntimeError> {
        self.server
            .get_library_meta(rating_key)
            .await
            .map_err(api_err)
    }

    /// Stream URL of the item's first trailer. Needs a detail response
    /// fetched with extras, as [`Runtime::meta`] does.
    pub fn trailer_url(&self, item: &MediaItem) -> Option<String> {
        let key = item.trailer_key()?;
        match self.server.media_url(key) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(key, "Bad trailer key: {e}");
                None
            }
        }
    }

    /// The server's copy of a cloud item, or [`NevuError::NotOnServer`].
    pub async fn resolve_local(&self, item: &MediaItem) -> Result<MediaItem, NevuError> {
        library::resolve_local(&self.server, item).await
    }

    pub async fn play_target(&self, item: &MediaItem) -> Result<PlayTarget, RuntimeError> {
        library::resolve_play(&self.server, item)
            .await
            .map_err(api_err)
    }

    /// Toggle watched state. Returns the item with its counters updated and
    /// the played flag sent, if any.
    pub async fn toggle_watched(&self, rating_key: &str) -> Result<(MediaItem, Option<bool>), RuntimeError> {
        let mut item = self.meta(rating_key).await?;
        let played = library::toggle_watched(&self.server, &mut item)
            .await
            .map_err(api_err)?;
        Ok((item, played))
    }

    pub async fn rate(&self, rating_key: &str, stars: Option<f32>) -> Result<(), RuntimeError> {
        library::rate(&self.server, rating_key, stars)
            .await
            .map_err(api_err)
    }

    pub async fn reviews(&self, item: &MediaItem) -> Result<ReviewsData, RuntimeError> {
        let id = item
            .community_id()
            .ok_or_else(|| RuntimeError::NotFound(format!("no GUID for {}", item.title)))?;
        self.community.get_user_reviews(id).await.map_err(api_err)
    }

    /// Genre shelves and a featured item for the home screen.
    pub async fn home(&self) -> Result<(Vec<Shelf>, Option<MediaItem>), RuntimeError> {
        let libraries = self.libraries().await?;
        let shelves = home::recommendation_shelves(&self.server, &libraries).await;
        let featured = home::random_item(&self.server, &libraries).await;
        Ok((shelves, featured))
    }

    /// Start the auto-next countdown for `current` if the user has it enabled.
    ///
    /// `on_fire` receives the target once the countdown reaches zero.
    pub async fn start_auto_next<F>(
        &self,
        current: &MediaItem,
        queue: &[MediaItem],
        on_fire: F,
    ) -> Option<(NextTarget, Countdown)>
    where
        F: FnOnce(NextTarget) + Send + 'static,
    {
        if !self.settings.auto_next_episode().await {
            return None;
        }
        let target = NextTarget::resolve(current, queue)?;
        let fired = target.clone();
        let countdown = Countdown::start(countdown_duration(current), move || on_fire(fired));
        Some((target, countdown))
    }

    /// End the session: forget tokens and drop the stores.
    pub async fn logout(self) -> Result<(), RuntimeError> {
        clear_credentials(&self.storage).await?;
        tracing::info!("logged out");
        Ok(())
    }
}
