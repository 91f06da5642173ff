//! `TvdbApi` trait definition.
#![allow(clippy::future_not_send)]

use anyhow::Result;

use super::types::SeriesRecord;

/// TheTVDB API trait.
///
/// Non-success responses are logged and reported as `None` (or as the
/// returned status code for `refresh_token`); only transport and decoding
/// failures are errors.
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(TvdbApi: Send)]
pub trait LocalTvdbApi {
    /// Logs in with the configured credentials, falling back to one token
    /// refresh when the login is rejected with 401.
    ///
    /// Returns the token held afterwards, which is `None` if neither call
    /// succeeded.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn login(&mut self) -> Result<Option<String>>;

    /// Refreshes the current token and returns the HTTP status code.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn refresh_token(&mut self) -> Result<u16>;

    /// Searches series by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn search(&self, name: &str) -> Result<Option<Vec<SeriesRecord>>>;

    /// Searches series by name and returns the closest match by title.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn search_closest_matching(&self, name: &str) -> Result<Option<SeriesRecord>>;

    /// Fetches one series record.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn get_serie_by_id(&self, serie_id: u64) -> Result<Option<SeriesRecord>>;
}
