//! `CacheStore` trait and its `SQLite` / in-memory implementations.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::Connection;

use super::connection::open_db;
use super::responses::{
    CachedResponse, clear_responses, count_responses, load_response, purge_expired, save_response,
};

/// Environment variable that switches the default backend to memory.
pub const TESTING_ENV_VAR: &str = "TVDB_CLIENT_TESTING";

/// Storage for cached responses.
///
/// One store belongs to one client; implementations do no locking of
/// their own.
pub trait CacheStore: Send + std::fmt::Debug {
    /// Returns the response stored under `key` unless it has expired at `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn get(&self, key: &str, now: DateTime<Utc>) -> Result<Option<CachedResponse>>;

    /// Stores `response` under `key`, replacing any previous entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn put(&mut self, key: &str, response: CachedResponse) -> Result<()>;

    /// Removes entries expired at `now`. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn purge_expired(&mut self, now: DateTime<Utc>) -> Result<usize>;

    /// Removes every entry. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn clear(&mut self) -> Result<usize>;

    /// Number of stored entries, expired ones included.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn count(&self) -> Result<usize>;
}

/// `SQLite`-backed store.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens the store in `dir` (or the default cache directory).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(dir: Option<&std::path::Path>) -> Result<Self> {
        let conn = open_db(dir)?;
        Ok(Self { conn })
    }
}

impl CacheStore for SqliteStore {
    fn get(&self, key: &str, now: DateTime<Utc>) -> Result<Option<CachedResponse>> {
        load_response(&self.conn, key, now)
    }

    fn put(&mut self, key: &str, response: CachedResponse) -> Result<()> {
        save_response(&self.conn, key, &response)
    }

    fn purge_expired(&mut self, now: DateTime<Utc>) -> Result<usize> {
        purge_expired(&self.conn, now)
    }

    fn clear(&mut self) -> Result<usize> {
        clear_responses(&self.conn)
    }

    fn count(&self) -> Result<usize> {
        count_responses(&self.conn)
    }
}

/// In-memory store. Contents are lost when the client is dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, CachedResponse>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str, now: DateTime<Utc>) -> Result<Option<CachedResponse>> {
        Ok(self
            .entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .cloned())
    }

    fn put(&mut self, key: &str, response: CachedResponse) -> Result<()> {
        self.entries.insert(String::from(key), response);
        Ok(())
    }

    fn purge_expired(&mut self, now: DateTime<Utc>) -> Result<usize> {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        Ok(before.saturating_sub(self.entries.len()))
    }

    fn clear(&mut self) -> Result<usize> {
        let removed = self.entries.len();
        self.entries.clear();
        Ok(removed)
    }

    fn count(&self) -> Result<usize> {
        Ok(self.entries.len())
    }
}

/// Which store backs the response cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheBackend {
    /// Persistent `SQLite` file in `dir` (default cache directory when `None`).
    Sqlite {
        /// Directory holding the database file.
        dir: Option<PathBuf>,
    },
    /// Process-local map.
    Memory,
}

impl CacheBackend {
    /// Memory when `TVDB_CLIENT_TESTING` is set, default `SQLite` location otherwise.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_testing_flag(std::env::var_os(TESTING_ENV_VAR).is_some())
    }

    const fn from_testing_flag(testing: bool) -> Self {
        if testing {
            Self::Memory
        } else {
            Self::Sqlite { dir: None }
        }
    }
}

/// Opens the store selected by `backend`.
///
/// # Errors
///
/// Returns an error if the `SQLite` database cannot be opened.
pub fn open_store(backend: &CacheBackend) -> Result<Box<dyn CacheStore>> {
    match backend {
        CacheBackend::Sqlite { dir } => {
            let store = SqliteStore::open(dir.as_deref()).context("failed to open SQLite cache")?;
            Ok(Box::new(store))
        }
        CacheBackend::Memory => Ok(Box::new(MemoryStore::new())),
    }
}
