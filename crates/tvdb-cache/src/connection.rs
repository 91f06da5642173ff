//! Database connection management.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::Connection;

use super::migrations::run_migrations;

/// Cache database file name.
const DB_FILE_NAME: &str = "tvdb_api_cache.db";

/// Opens (or creates) the cache database and runs migrations.
///
/// - If `dir` is `Some`, uses `{dir}/tvdb_api_cache.db`.
/// - Otherwise uses `~/.cache/tvdb/tvdb_api_cache.db`.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or migrations fail.
pub fn open_db(dir: Option<&Path>) -> Result<Connection> {
    let db_path = resolve_db_path(dir)?;

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    let conn = Connection::open(&db_path)
        .with_context(|| format!("failed to open cache database {}", db_path.display()))?;

    run_migrations(&conn).context("cache database migration failed")?;

    tracing::debug!(path = %db_path.display(), "Opened response cache");
    Ok(conn)
}

/// Resolves the cache database file path.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined (when `dir` is `None`).
pub fn resolve_db_path(dir: Option<&Path>) -> Result<PathBuf> {
    let cache_dir = match dir {
        Some(dir) => dir.to_path_buf(),
        None => default_cache_dir()?,
    };
    Ok(cache_dir.join(DB_FILE_NAME))
}

/// `~/.cache/tvdb`.
fn default_cache_dir() -> Result<PathBuf> {
    let home = std::env::var_os("HOME").context("HOME environment variable is not set")?;
    Ok(Path::new(&home).join(".cache").join("tvdb"))
}
