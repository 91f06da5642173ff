//! Application configuration module.
//!
//! Manages the TOML config file holding fallback credentials and
//! response cache settings.

#[allow(clippy::module_inception)]
mod config;

#[allow(clippy::module_name_repetitions)]
pub use config::{AppConfig, CacheBackendKind, CacheConfig, CredentialsConfig};
