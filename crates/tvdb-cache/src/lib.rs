//! Response cache for the TheTVDB client.
//!
//! Stores raw HTTP responses keyed by request identity for a bounded
//! retention window. Backed by `rusqlite` (bundled `SQLite`) or by an
//! in-memory map.

mod connection;
mod migrations;
/// Cached response CRUD operations.
pub mod responses;
mod store;

#[allow(clippy::module_name_repetitions)]
pub use connection::{open_db, resolve_db_path};
pub use responses::CachedResponse;
#[allow(clippy::module_name_repetitions)]
pub use store::{CacheBackend, CacheStore, MemoryStore, SqliteStore, TESTING_ENV_VAR, open_store};
