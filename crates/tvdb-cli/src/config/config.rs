//! `AppConfig` struct and TOML read/write.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tvdb_api::tvdb::Credentials;
use tvdb_cache::CacheBackend;

/// Config file name inside the config directory.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default retention window in seconds (6 hours).
const DEFAULT_EXPIRE_AFTER_SECS: u64 = 21_600;

/// Top-level application configuration.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// Fallback credentials.
    #[serde(default)]
    pub credentials: CredentialsConfig,
    /// Response cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Credentials used when the matching environment variable is unset.
#[derive(Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CredentialsConfig {
    /// Account name.
    #[serde(default)]
    pub user_name: String,
    /// Account secret key.
    #[serde(default)]
    pub user_key: String,
    /// API key.
    #[serde(default)]
    pub api_key: String,
}

impl CredentialsConfig {
    /// Converts to client credentials.
    #[must_use]
    pub fn to_credentials(&self) -> Credentials {
        Credentials::new(
            self.user_name.as_str(),
            self.user_key.as_str(),
            self.api_key.as_str(),
        )
    }
}

impl fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.to_credentials(), f)
    }
}

/// Store kind for the response cache.
#[derive(Debug, Serialize, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
    /// `SQLite` file next to the config.
    #[default]
    Sqlite,
    /// Process-local map.
    Memory,
}

/// Response cache configuration.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheConfig {
    /// Store kind.
    #[serde(default)]
    pub backend: CacheBackendKind,
    /// Retention window in seconds.
    #[serde(default = "default_expire_after_secs")]
    pub expire_after_secs: u64,
}

const fn default_expire_after_secs() -> u64 {
    DEFAULT_EXPIRE_AFTER_SECS
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackendKind::default(),
            expire_after_secs: DEFAULT_EXPIRE_AFTER_SECS,
        }
    }
}

impl CacheConfig {
    /// Backend to open; the `SQLite` file lives in `dir` when given.
    #[must_use]
    pub fn backend(&self, dir: Option<&Path>) -> CacheBackend {
        match self.backend {
            CacheBackendKind::Sqlite => CacheBackend::Sqlite {
                dir: dir.map(Path::to_path_buf),
            },
            CacheBackendKind::Memory => CacheBackend::Memory,
        }
    }

    /// Retention window.
    #[must_use]
    pub const fn expire_after(&self) -> Duration {
        Duration::from_secs(self.expire_after_secs)
    }
}

impl AppConfig {
    /// Config file location: `{dir}/config.toml`, or
    /// `~/.config/tvdb/config.toml` without `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` is `None` and `HOME` is unset.
    pub fn path(dir: Option<&Path>) -> Result<PathBuf> {
        let config_dir = match dir {
            Some(dir) => dir.to_path_buf(),
            None => std::env::var_os("HOME")
                .map(|home| Path::new(&home).join(".config").join("tvdb"))
                .context("HOME environment variable is not set")?,
        };
        Ok(config_dir.join(CONFIG_FILE_NAME))
    }

    /// Loads config from a TOML file. Returns default if file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Saves config to a TOML file, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation or file write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("failed to serialize config to TOML")?;
        std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_default_config() {
        // Arrange & Act
        let config = AppConfig::default();

        // Assert
        assert!(config.credentials.api_key.is_empty());
        assert_eq!(config.cache.backend, CacheBackendKind::Sqlite);
        assert_eq!(config.cache.expire_after(), Duration::from_secs(21_600));
    }

    #[test]
    fn test_path_in_given_dir() {
        // Arrange
        let dir = PathBuf::from("/tmp/tvdb-config");

        // Act
        let path = AppConfig::path(Some(&dir)).unwrap();

        // Assert
        assert_eq!(path, PathBuf::from("/tmp/tvdb-config/config.toml"));
    }

    #[test]
    fn test_path_defaults_under_home() {
        // Arrange & Act
        let path = AppConfig::path(None).unwrap();

        // Assert
        assert!(path.ends_with(".config/tvdb/config.toml"));
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        // Arrange
        let path = Path::new("/tmp/tvdb_test_nonexistent_config.toml");

        // Act
        let config = AppConfig::load(path).unwrap();

        // Assert
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = AppConfig {
            credentials: CredentialsConfig {
                user_name: String::from("alice"),
                user_key: String::from("secret"),
                api_key: String::from("api"),
            },
            cache: CacheConfig {
                backend: CacheBackendKind::Memory,
                expire_after_secs: 60,
            },
        };

        // Act
        config.save(&path).unwrap();
        let loaded = AppConfig::load(&path).unwrap();

        // Assert
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_partial_config() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[credentials]\napi_key = \"api\"\n\n[cache]\nbackend = \"memory\"\n")
            .unwrap();

        // Act
        let config = AppConfig::load(&path).unwrap();

        // Assert
        assert_eq!(config.credentials.api_key, "api");
        assert!(config.credentials.user_name.is_empty());
        assert_eq!(config.cache.backend, CacheBackendKind::Memory);
        assert_eq!(config.cache.expire_after_secs, 21_600);
    }

    #[test]
    fn test_load_invalid_backend_fails() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[cache]\nbackend = \"redis\"\n").unwrap();

        // Act
        let result = AppConfig::load(&path);

        // Assert
        assert!(result.is_err());
    }

    #[test]
    fn test_cache_backend_uses_dir() {
        // Arrange
        let config = CacheConfig::default();
        let dir = PathBuf::from("/tmp/tvdb");

        // Act
        let backend = config.backend(Some(&dir));

        // Assert
        assert_eq!(
            backend,
            CacheBackend::Sqlite {
                dir: Some(PathBuf::from("/tmp/tvdb"))
            }
        );
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        // Arrange
        let config = CredentialsConfig {
            user_name: String::from("alice"),
            user_key: String::from("hidden-key"),
            api_key: String::from("hidden-api"),
        };

        // Act
        let debug = format!("{config:?}");

        // Assert
        assert!(debug.contains("alice"));
        assert!(!debug.contains("hidden"));
    }
}
