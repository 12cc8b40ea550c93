use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::RwLock;

use nevu_api::traits::SettingsBackend;

pub const DISABLE_WATCHSCREEN_DARKENING: &str = "DISABLE_WATCHSCREEN_DARKENING";
pub const AUTO_MATCH_TRACKS: &str = "AUTO_MATCH_TRACKS";
pub const AUTO_NEXT_EP: &str = "AUTO_NEXT_EP";

const DEFAULTS: &[(&str, &str)] = &[
    (DISABLE_WATCHSCREEN_DARKENING, "false"),
    (AUTO_MATCH_TRACKS, "true"),
    (AUTO_NEXT_EP, "true"),
];

fn default_map() -> BTreeMap<String, String> {
    DEFAULTS
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// User preferences, defaulted locally and synced to the backend.
///
/// Values are strings; boolean flags use `"true"` / `"false"`.
pub struct SettingsStore<B> {
    backend: B,
    settings: RwLock<BTreeMap<String, String>>,
    loaded: AtomicBool,
}

impl<B: SettingsBackend> SettingsStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            settings: RwLock::new(default_map()),
            loaded: AtomicBool::new(false),
        }
    }

    /// Merge remote values over the current map.
    ///
    /// `loaded` becomes true whether or not the fetch succeeded.
    pub async fn fetch_settings(&self) {
        match self.backend.fetch_options().await {
            Ok(options) => {
                tracing::debug!(count = options.len(), "user options fetched");
                let mut settings = self.settings.write().await;
                for opt in options {
                    settings.insert(opt.key, opt.value);
                }
            }
            Err(e) => tracing::warn!("Failed to fetch user options, using defaults: {e}"),
        }
        self.loaded.store(true, Ordering::Release);
    }

    /// Set `key` locally, then persist it remotely.
    ///
    /// The local value is visible before the remote call resolves and stays
    /// even if it fails.
    pub async fn set_setting(&self, key: &str, value: &str) {
        self.set_local(key, value).await;

        if let Err(e) = self.backend.upsert_option(key, value).await {
            tracing::warn!(key, "Failed to save user option: {e}");
        }
    }

    /// Set `key` without syncing it.
    pub async fn set_local(&self, key: &str, value: &str) {
        self.settings
            .write()
            .await
            .insert(key.to_string(), value.to_string());
    }

    /// Flip a boolean flag and return its new value.
    pub async fn toggle(&self, key: &str) -> bool {
        let next = !self.get_bool(key).await;
        self.set_setting(key, if next { "true" } else { "false" })
            .await;
        next
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        self.settings.read().await.get(key).cloned()
    }

    /// `true` only for the exact string `"true"`.
    pub async fn get_bool(&self, key: &str) -> bool {
        self.settings
            .read()
            .await
            .get(key)
            .is_some_and(|v| v == "true")
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    pub async fn snapshot(&self) -> BTreeMap<String, String> {
        self.settings.read().await.clone()
    }

    pub async fn auto_next_episode(&self) -> bool {
        self.get_bool(AUTO_NEXT_EP).await
    }

    pub async fn auto_match_tracks(&self) -> bool {
        self.get_bool(AUTO_MATCH_TRACKS).await
    }

    pub async fn disable_watchscreen_darkening(&self) -> bool {
        self.get_bool(DISABLE_WATCHSCREEN_DARKENING).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tokio::sync::Notify;

    use nevu_core::models::UserOption;

    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("backend unavailable")]
    struct Unavailable;

    #[derive(Default)]
    struct FakeBackend {
        remote: Vec<UserOption>,
        fail: bool,
        upserts: Mutex<Vec<(String, String)>>,
        gate: Option<(Notify, Notify)>,
    }

    impl SettingsBackend for FakeBackend {
        type Error = Unavailable;

        async fn fetch_options(&self) -> Result<Vec<UserOption>, Unavailable> {
            if self.fail {
                return Err(Unavailable);
            }
            Ok(self.remote.clone())
        }

        async fn upsert_option(&self, key: &str, value: &str) -> Result<(), Unavailable> {
            if let Some((entered, release)) = &self.gate {
                entered.notify_one();
                release.notified().await;
            }
            self.upserts
                .lock()
                .unwrap()
                .push((key.to_string(), value.to_string()));
            if self.fail {
                Err(Unavailable)
            } else {
                Ok(())
            }
        }
    }

    fn opt(key: &str, value: &str) -> UserOption {
        UserOption {
            key: key.into(),
            value: value.into(),
        }
    }

    #[tokio::test]
    async fn test_defaults_before_fetch() {
        let store = SettingsStore::new(FakeBackend::default());
        assert!(!store.is_loaded());
        assert!(store.auto_next_episode().await);
        assert!(store.auto_match_tracks().await);
        assert!(!store.disable_watchscreen_darkening().await);
        assert_eq!(store.get("UNKNOWN").await, None);
    }

    #[tokio::test]
    async fn test_fetch_merges_over_defaults() {
        let store = SettingsStore::new(FakeBackend {
            remote: vec![opt(AUTO_NEXT_EP, "false"), opt("EXTRA", "1")],
            ..Default::default()
        });
        store.fetch_settings().await;

        assert!(store.is_loaded());
        let snap = store.snapshot().await;
        assert_eq!(snap[AUTO_NEXT_EP], "false");
        assert_eq!(snap[AUTO_MATCH_TRACKS], "true");
        assert_eq!(snap[DISABLE_WATCHSCREEN_DARKENING], "false");
        assert_eq!(snap["EXTRA"], "1");
    }

    #[tokio::test]
    async fn test_failed_fetch_still_loaded() {
        let store = SettingsStore::new(FakeBackend {
            fail: true,
            ..Default::default()
        });
        store.fetch_settings().await;
        assert!(store.is_loaded());
        assert_eq!(store.snapshot().await, default_map());
    }

    #[tokio::test]
    async fn test_set_visible_before_remote_resolves() {
        let store = Arc::new(SettingsStore::new(FakeBackend {
            gate: Some((Notify::new(), Notify::new())),
            ..Default::default()
        }));

        let task = tokio::spawn({
            let store = Arc::clone(&store);
            async move { store.set_setting(AUTO_NEXT_EP, "false").await }
        });

        let (entered, release) = store.backend.gate.as_ref().unwrap();
        entered.notified().await;
        assert_eq!(store.get(AUTO_NEXT_EP).await.as_deref(), Some("false"));
        assert!(store.backend.upserts.lock().unwrap().is_empty());

        release.notify_one();
        task.await.unwrap();
        assert_eq!(
            *store.backend.upserts.lock().unwrap(),
            vec![(AUTO_NEXT_EP.to_string(), "false".to_string())]
        );
    }

    #[tokio::test]
    async fn test_set_kept_when_remote_fails() {
        let store = SettingsStore::new(FakeBackend {
            fail: true,
            ..Default::default()
        });
        store.set_setting(AUTO_MATCH_TRACKS, "false").await;
        assert!(!store.auto_match_tracks().await);
    }

    #[tokio::test]
    async fn test_toggle() {
        let store = SettingsStore::new(FakeBackend::default());
        assert!(store.toggle(DISABLE_WATCHSCREEN_DARKENING).await);
        assert!(!store.toggle(DISABLE_WATCHSCREEN_DARKENING).await);
        assert_eq!(store.backend.upserts.lock().unwrap().len(), 2);
    }
}
