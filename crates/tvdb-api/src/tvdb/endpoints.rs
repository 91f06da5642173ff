//! TheTVDB endpoint URLs.

use anyhow::{Context, Result};
use url::Url;

/// Default base URL for the TheTVDB JSON API.
pub const DEFAULT_BASE_URL: &str = "https://api.thetvdb.com/";

/// Endpoint registry rooted at one API host.
///
/// Only login, refresh, search and series are used by the client; the
/// rest are listed for callers building their own requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base_url: Url,
}

impl Endpoints {
    /// Creates a registry under `base_url`. A missing trailing slash is added
    /// so that relative paths extend the base path instead of replacing it.
    #[must_use]
    pub fn new(mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self { base_url }
    }

    /// Registry for the public TheTVDB host.
    ///
    /// # Errors
    ///
    /// Returns an error if the default base URL fails to parse.
    pub fn default_host() -> Result<Self> {
        let url = Url::parse(DEFAULT_BASE_URL).context("invalid default base URL")?;
        Ok(Self::new(url))
    }

    /// Base URL every endpoint is joined onto.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn join(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("failed to join URL path: {path}"))
    }

    /// `POST /login`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be built.
    pub fn login(&self) -> Result<Url> {
        self.join("login")
    }

    /// `GET /refresh_token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be built.
    pub fn refresh_token(&self) -> Result<Url> {
        self.join("refresh_token")
    }

    /// `GET /search/series`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be built.
    pub fn search(&self) -> Result<Url> {
        self.join("search/series")
    }

    /// `/series`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be built.
    pub fn series(&self) -> Result<Url> {
        self.join("series")
    }

    /// `GET /series/{id}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be built.
    pub fn series_by_id(&self, serie_id: u64) -> Result<Url> {
        self.join(&format!("series/{serie_id}"))
    }

    /// `/episodes`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be built.
    pub fn episodes(&self) -> Result<Url> {
        self.join("episodes")
    }

    /// `/movies`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be built.
    pub fn movies(&self) -> Result<Url> {
        self.join("movies")
    }

    /// `/updated/query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be built.
    pub fn updated_query(&self) -> Result<Url> {
        self.join("updated/query")
    }

    /// `/updated/query/params`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be built.
    pub fn updated_query_params(&self) -> Result<Url> {
        self.join("updated/query/params")
    }

    /// `/languages`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be built.
    pub fn languages(&self) -> Result<Url> {
        self.join("languages")
    }

    /// `/user`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be built.
    pub fn user(&self) -> Result<Url> {
        self.join("user")
    }

    /// `/user/favorites`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be built.
    pub fn user_favorites(&self) -> Result<Url> {
        self.join("user/favorites")
    }

    /// `/user/ratings`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be built.
    pub fn user_ratings(&self) -> Result<Url> {
        self.join("user/ratings")
    }

    /// `/user/ratings/query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be built.
    pub fn user_ratings_query(&self) -> Result<Url> {
        self.join("user/ratings/query")
    }

    /// `/user/ratings/query/params`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be built.
    pub fn user_ratings_query_params(&self) -> Result<Url> {
        self.join("user/ratings/query/params")
    }
}
