//! Cached response CRUD operations.

use anyhow::{Context, Result};
use chrono::{DateTime, TimeDelta, Utc};
use rusqlite::{Connection, OptionalExtension};

/// A stored HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: String,
    /// When the response was stored.
    pub created_at: DateTime<Utc>,
    /// When the response stops being served.
    pub expires_at: DateTime<Utc>,
}

impl CachedResponse {
    /// Creates a response stored at `created_at` and retained for `expire_after`.
    #[must_use]
    pub fn new(
        status: u16,
        body: impl Into<String>,
        created_at: DateTime<Utc>,
        expire_after: TimeDelta,
    ) -> Self {
        let expires_at = created_at
            .checked_add_signed(expire_after)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            status,
            body: body.into(),
            created_at,
            expires_at,
        }
    }

    /// Returns `true` once `now` has reached the expiry time.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Converts a stored unix timestamp back to UTC.
fn from_unix(secs: i64) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .with_context(|| format!("invalid timestamp in cache: {secs}"))
}

/// Loads a non-expired response by key.
///
/// # Errors
///
/// Returns an error if the database query fails or a stored timestamp is invalid.
pub fn load_response(
    conn: &Connection,
    key: &str,
    now: DateTime<Utc>,
) -> Result<Option<CachedResponse>> {
    let row: Option<(u16, String, i64, i64)> = conn
        .query_row(
            "SELECT status, body, created_at, expires_at
             FROM responses
             WHERE cache_key = ?1 AND expires_at > ?2",
            rusqlite::params![key, now.timestamp()],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .optional()
        .context("failed to query cached response")?;

    row.map(|(status, body, created_at, expires_at)| {
        Ok(CachedResponse {
            status,
            body,
            created_at: from_unix(created_at)?,
            expires_at: from_unix(expires_at)?,
        })
    })
    .transpose()
}

/// Inserts or replaces the response stored under `key`.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn save_response(conn: &Connection, key: &str, response: &CachedResponse) -> Result<()> {
    conn.execute(
        "INSERT INTO responses (cache_key, status, body, created_at, expires_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(cache_key) DO UPDATE SET
            status = excluded.status,
            body = excluded.body,
            created_at = excluded.created_at,
            expires_at = excluded.expires_at",
        rusqlite::params![
            key,
            response.status,
            response.body,
            response.created_at.timestamp(),
            response.expires_at.timestamp(),
        ],
    )
    .context("failed to save cached response")?;
    Ok(())
}

/// Deletes every response expired at `now`. Returns the number of rows removed.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn purge_expired(conn: &Connection, now: DateTime<Utc>) -> Result<usize> {
    conn.execute(
        "DELETE FROM responses WHERE expires_at <= ?1",
        [now.timestamp()],
    )
    .context("failed to purge expired responses")
}

/// Deletes every stored response. Returns the number of rows removed.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn clear_responses(conn: &Connection) -> Result<usize> {
    conn.execute("DELETE FROM responses", [])
        .context("failed to clear cached responses")
}

/// Counts stored responses, expired or not.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_responses(conn: &Connection) -> Result<usize> {
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM responses", [], |row| row.get(0))
        .context("failed to count cached responses")?;
    usize::try_from(count).context("failed to convert response count")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::migrations::run_migrations;

    fn setup_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_new_computes_expiry() {
        // Arrange & Act
        let response = CachedResponse::new(200, "{}", at(1_000), TimeDelta::seconds(60));

        // Assert
        assert_eq!(response.expires_at, at(1_060));
        assert!(!response.is_expired(at(1_059)));
        assert!(response.is_expired(at(1_060)));
    }

    #[test]
    fn test_save_and_load() {
        // Arrange
        let conn = setup_db();
        let response = CachedResponse::new(200, r#"{"data":[]}"#, at(1_000), TimeDelta::hours(6));

        // Act
        save_response(&conn, "GET /search", &response).unwrap();
        let loaded = load_response(&conn, "GET /search", at(1_001)).unwrap();

        // Assert
        assert_eq!(loaded, Some(response));
    }

    #[test]
    fn test_load_missing_key() {
        // Arrange
        let conn = setup_db();

        // Act
        let loaded = load_response(&conn, "GET /nothing", at(0)).unwrap();

        // Assert
        assert!(loaded.is_none());
    }

    #[test]
    fn test_load_ignores_expired() {
        // Arrange
        let conn = setup_db();
        let response = CachedResponse::new(200, "{}", at(1_000), TimeDelta::seconds(10));
        save_response(&conn, "k", &response).unwrap();

        // Act
        let loaded = load_response(&conn, "k", at(1_010)).unwrap();

        // Assert
        assert!(loaded.is_none());
        assert_eq!(count_responses(&conn).unwrap(), 1);
    }

    #[test]
    fn test_save_overwrites_existing_key() {
        // Arrange
        let conn = setup_db();
        let first = CachedResponse::new(200, "old", at(1_000), TimeDelta::hours(1));
        let second = CachedResponse::new(200, "new", at(2_000), TimeDelta::hours(1));

        // Act
        save_response(&conn, "k", &first).unwrap();
        save_response(&conn, "k", &second).unwrap();

        // Assert
        let loaded = load_response(&conn, "k", at(2_001)).unwrap().unwrap();
        assert_eq!(loaded.body, "new");
        assert_eq!(count_responses(&conn).unwrap(), 1);
    }

    #[test]
    fn test_purge_expired_keeps_fresh_rows() {
        // Arrange
        let conn = setup_db();
        save_response(
            &conn,
            "stale",
            &CachedResponse::new(200, "a", at(0), TimeDelta::seconds(10)),
        )
        .unwrap();
        save_response(
            &conn,
            "fresh",
            &CachedResponse::new(200, "b", at(0), TimeDelta::seconds(100)),
        )
        .unwrap();

        // Act
        let removed = purge_expired(&conn, at(50)).unwrap();

        // Assert
        assert_eq!(removed, 1);
        assert!(load_response(&conn, "fresh", at(50)).unwrap().is_some());
    }

    #[test]
    fn test_clear_responses() {
        // Arrange
        let conn = setup_db();
        for key in ["a", "b", "c"] {
            save_response(
                &conn,
                key,
                &CachedResponse::new(200, "x", at(0), TimeDelta::hours(1)),
            )
            .unwrap();
        }

        // Act
        let removed = clear_responses(&conn).unwrap();

        // Assert
        assert_eq!(removed, 3);
        assert_eq!(count_responses(&conn).unwrap(), 0);
    }
}
