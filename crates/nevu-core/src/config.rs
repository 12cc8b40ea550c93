use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::NevuError;

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub server: ServerConfig,
    pub client: ClientConfig,
    pub features: FeatureConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub product: String,
    /// Max streaming bitrate in kbps.
    pub quality: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureConfig {
    pub disable_proxy: bool,
    pub disable_nevu_sync: bool,
}

/// The `config` blob the web client keeps in local storage.
///
/// Keys use the upper-case names the backend expects. Missing keys keep the
/// value from `AppConfig`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredFeatureFlags {
    #[serde(rename = "DISABLE_PROXY", default, skip_serializing_if = "Option::is_none")]
    pub disable_proxy: Option<bool>,
    #[serde(
        rename = "DISABLE_NEVU_SYNC",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub disable_nevu_sync: Option<bool>,
}

impl AppConfig {
    /// Load config: the user file (if it exists) is merged over the
    /// built-in defaults, so it only needs the keys it changes.
    pub fn load() -> Result<Self, NevuError> {
        let user_path = Self::config_path();
        if user_path.exists() {
            let user_str = std::fs::read_to_string(&user_path)?;
            Self::with_overrides(&user_str)
        } else {
            Self::with_overrides("")
        }
    }

    /// Built-in defaults with the tables and keys of `user` laid over them.
    pub fn with_overrides(user: &str) -> Result<Self, NevuError> {
        let mut merged: toml::Table = DEFAULT_CONFIG
            .parse()
            .map_err(|e: toml::de::Error| NevuError::Config(e.to_string()))?;
        let overrides: toml::Table = user
            .parse()
            .map_err(|e: toml::de::Error| NevuError::Config(e.to_string()))?;
        merge_tables(&mut merged, overrides);
        toml::Value::Table(merged)
            .try_into::<Self>()
            .map_err(|e| NevuError::Config(e.to_string()))
    }

    /// Apply the flags stored by the web client on top of the file config.
    pub fn apply_stored_flags(&mut self, flags: &StoredFeatureFlags) {
        if let Some(v) = flags.disable_proxy {
            self.features.disable_proxy = v;
        }
        if let Some(v) = flags.disable_nevu_sync {
            self.features.disable_nevu_sync = v;
        }
    }

    /// Backend base URL without a trailing slash.
    pub fn backend_url(&self) -> &str {
        self.backend.url.trim_end_matches('/')
    }

    /// Plex server base URL without a trailing slash, `None` until login.
    pub fn server_url(&self) -> Option<&str> {
        let url = self.server.url.trim_end_matches('/');
        (!url.is_empty()).then_some(url)
    }

    /// Path to user config file (XDG on Linux, AppData on Windows).
    pub fn config_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Path to the local storage database.
    pub fn storage_path() -> PathBuf {
        Self::data_dir().join("storage.db")
    }

    /// Ensure the data directory exists and return the storage path.
    pub fn ensure_storage_path() -> Result<PathBuf, NevuError> {
        let path = Self::storage_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(path)
    }

    /// Directory for the storage database and log files.
    pub fn data_dir() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "nevu")
    }
}

fn merge_tables(base: &mut toml::Table, overrides: toml::Table) {
    for (key, value) in overrides {
        if let toml::Value::Table(table) = value {
            if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
                merge_tables(existing, table);
                continue;
            }
            base.insert(key, toml::Value::Table(table));
        } else {
            base.insert(key, value);
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("built-in default config is valid TOML")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let config = AppConfig::default();
        assert_eq!(config.backend_url(), "http://localhost:3000");
        assert_eq!(config.client.quality, 12000);
        assert!(config.server_url().is_none());
        assert!(!config.features.disable_proxy);
    }

    #[test]
    fn test_roundtrip() {
        let mut config = AppConfig::default();
        config.server.url = "http://10.0.0.2:32400/".into();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(deserialized.server_url(), Some("http://10.0.0.2:32400"));
    }

    #[test]
    fn test_partial_user_file_keeps_defaults() {
        let config =
            AppConfig::with_overrides("[server]\nurl = \"http://10.0.0.2:32400\"\n").unwrap();
        assert_eq!(config.server_url(), Some("http://10.0.0.2:32400"));
        assert_eq!(config.backend_url(), "http://localhost:3000");
        assert_eq!(config.client.product, "Nevu");
        assert_eq!(config.client.quality, 12000);
    }

    #[test]
    fn test_user_file_overrides_single_keys() {
        let config = AppConfig::with_overrides(
            "[client]\nquality = 4000\n\n[features]\ndisable_proxy = true\n",
        )
        .unwrap();
        assert_eq!(config.client.quality, 4000);
        assert_eq!(config.client.product, "Nevu");
        assert!(config.features.disable_proxy);
        assert!(!config.features.disable_nevu_sync);
    }

    #[test]
    fn test_invalid_user_file_is_config_error() {
        assert!(matches!(
            AppConfig::with_overrides("[client]\nquality = \"high\"\n"),
            Err(NevuError::Config(_))
        ));
    }

    #[test]
    fn test_stored_flags_overlay() {
        let mut config = AppConfig::default();
        let flags: StoredFeatureFlags =
            serde_json::from_str(r#"{"DISABLE_PROXY":true}"#).unwrap();
        config.apply_stored_flags(&flags);
        assert!(config.features.disable_proxy);
        assert!(!config.features.disable_nevu_sync);
    }
}
