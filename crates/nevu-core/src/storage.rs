use std::collections::HashMap;
use std::path::Path;

use chrono::Utc;
use rand::distr::Alphanumeric;
use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;

use crate::config::StoredFeatureFlags;
use crate::error::NevuError;

const SCHEMA: &str = include_str!("../../../migrations/001_local_storage.sql");

/// Length of a generated client identifier.
const CLIENT_ID_LEN: usize = 24;

/// Bitrate stored when no quality was ever chosen.
pub const DEFAULT_QUALITY: &str = "12000";

/// Well-known storage keys. Names match the web client's so a profile can be
/// carried over verbatim.
pub mod keys {
    pub const CLIENT_ID: &str = "clientID";
    pub const SESSION_ID: &str = "sessionID";
    /// plex.tv account token (cloud services, backend).
    pub const ACCOUNT_TOKEN: &str = "accAccessToken";
    /// Server access token (media server requests).
    pub const SERVER_TOKEN: &str = "accessToken";
    pub const SERVER: &str = "server";
    pub const SORT_BY: &str = "sortBy";
    pub const PRIMARY_FILTER: &str = "primaryFilter";
    pub const TYPE_FILTER: &str = "typeFilter";
    pub const QUALITY: &str = "quality";
    pub const CONFIG: &str = "config";
}

/// Persistent string key-value store, the desktop stand-in for browser
/// local storage.
pub struct LocalStorage {
    conn: Connection,
}

impl LocalStorage {
    /// Open (or create) the store at the given path.
    pub fn open(path: &Path) -> Result<Self, NevuError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Open an in-memory store (for tests).
    pub fn open_memory() -> Result<Self, NevuError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, NevuError> {
        self.conn
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn set(&self, key: &str, value: &str) -> Result<(), NevuError> {
        self.conn.execute(
            "INSERT INTO local_storage (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<(), NevuError> {
        self.conn
            .execute("DELETE FROM local_storage WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// All stored keys, sorted.
    pub fn keys(&self) -> Result<Vec<String>, NevuError> {
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM local_storage ORDER BY key")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<Result<Vec<String>, _>>().map_err(Into::into)
    }

    /// Read a JSON-encoded value. Unparseable values read as `None`.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, NevuError> {
        Ok(self.get(key)?.and_then(|raw| match serde_json::from_str(&raw) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(key, "ignoring malformed stored value: {e}");
                None
            }
        }))
    }

    /// Feature flags the web client keeps under `config`.
    pub fn feature_flags(&self) -> Result<StoredFeatureFlags, NevuError> {
        Ok(self.get_json(keys::CONFIG)?.unwrap_or_default())
    }

    /// Write values that must always exist.
    pub fn ensure_defaults(&self) -> Result<(), NevuError> {
        if self.get(keys::QUALITY)?.is_none() {
            self.set(keys::QUALITY, DEFAULT_QUALITY)?;
        }
        Ok(())
    }
}

/// Per-process key-value store, the stand-in for browser session storage.
#[derive(Debug, Default, Clone)]
pub struct SessionStorage {
    values: HashMap<String, String>,
}

impl SessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }
}

/// Identifiers sent with every server request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    /// Stable per installation.
    pub client_id: String,
    /// Fresh per process.
    pub session_id: String,
}

impl ClientIdentity {
    /// Read the client id (creating it on first run) and start a new session.
    pub fn ensure(local: &LocalStorage, session: &mut SessionStorage) -> Result<Self, NevuError> {
        let client_id = match local.get(keys::CLIENT_ID)? {
            Some(id) if !id.is_empty() => id,
            _ => {
                let id = make_id(CLIENT_ID_LEN);
                local.set(keys::CLIENT_ID, &id)?;
                tracing::info!("generated new client identifier");
                id
            }
        };

        let session_id = uuid::Uuid::new_v4().to_string();
        session.set(keys::SESSION_ID, session_id.clone());

        Ok(Self {
            client_id,
            session_id,
        })
    }
}

/// Random alphanumeric identifier.
pub fn make_id(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let store = LocalStorage::open_memory().unwrap();
        assert_eq!(store.get(keys::SORT_BY).unwrap(), None);
        store.set(keys::SORT_BY, "year:desc").unwrap();
        store.set(keys::SORT_BY, "title:asc").unwrap();
        assert_eq!(store.get(keys::SORT_BY).unwrap().as_deref(), Some("title:asc"));
        store.remove(keys::SORT_BY).unwrap();
        assert_eq!(store.get(keys::SORT_BY).unwrap(), None);
    }

    #[test]
    fn test_persists_across_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.db");
        {
            let store = LocalStorage::open(&path).unwrap();
            store.set(keys::SERVER, "http://10.0.0.2:32400").unwrap();
        }
        let store = LocalStorage::open(&path).unwrap();
        assert_eq!(
            store.get(keys::SERVER).unwrap().as_deref(),
            Some("http://10.0.0.2:32400")
        );
        assert_eq!(store.keys().unwrap(), vec![keys::SERVER.to_string()]);
    }

    #[test]
    fn test_client_identity() {
        let store = LocalStorage::open_memory().unwrap();
        let mut session = SessionStorage::new();

        let first = ClientIdentity::ensure(&store, &mut session).unwrap();
        assert_eq!(first.client_id.len(), CLIENT_ID_LEN);
        assert!(first.client_id.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(session.get(keys::SESSION_ID), Some(first.session_id.as_str()));

        let second = ClientIdentity::ensure(&store, &mut session).unwrap();
        assert_eq!(first.client_id, second.client_id);
        assert_ne!(first.session_id, second.session_id);
    }

    #[test]
    fn test_defaults_and_flags() {
        let store = LocalStorage::open_memory().unwrap();
        store.ensure_defaults().unwrap();
        assert_eq!(store.get(keys::QUALITY).unwrap().as_deref(), Some(DEFAULT_QUALITY));
        store.set(keys::QUALITY, "4000").unwrap();
        store.ensure_defaults().unwrap();
        assert_eq!(store.get(keys::QUALITY).unwrap().as_deref(), Some("4000"));

        assert!(store.feature_flags().unwrap().disable_proxy.is_none());
        store.set(keys::CONFIG, "not json").unwrap();
        assert!(store.feature_flags().unwrap().disable_proxy.is_none());
        store
            .set(keys::CONFIG, r#"{"DISABLE_PROXY":true,"DISABLE_NEVU_SYNC":false}"#)
            .unwrap();
        let flags = store.feature_flags().unwrap();
        assert_eq!(flags.disable_proxy, Some(true));
        assert_eq!(flags.disable_nevu_sync, Some(false));
    }
}
