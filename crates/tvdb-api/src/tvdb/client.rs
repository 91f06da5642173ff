//! `TvdbClient` - TheTVDB API client implementation.
#![allow(clippy::future_not_send)]

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::instrument;
use tvdb_cache::{CacheBackend, open_store};
use url::Url;

use super::api::LocalTvdbApi;
use super::credentials::{CredentialSource, Credentials, EnvCredentials};
use super::endpoints::Endpoints;
use super::matching::closest_match;
use super::types::{DataResponse, SeriesRecord, TokenResponse};
use crate::http::{
    ApiRequest, ApiResponse, CachedTransport, DEFAULT_EXPIRE_AFTER, LocalHttpTransport,
    ReqwestTransport,
};

/// Default `Accept-Language` tag.
const DEFAULT_LANGUAGE: &str = "en";

/// Default User-Agent.
const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Status code of every successful TheTVDB response.
const STATUS_OK: u16 = 200;

/// Status code of a rejected login or an expired token.
const STATUS_UNAUTHORIZED: u16 = 401;

/// Transport stack used by [`TvdbClientBuilder::build`].
pub type DefaultTransport = CachedTransport<ReqwestTransport>;

/// TheTVDB API client.
///
/// Owns the session token; the token is replaced on every successful
/// login or refresh and is never expired client-side.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct TvdbClient<T = DefaultTransport> {
    /// Transport every request goes through.
    transport: T,
    /// Endpoint URLs.
    endpoints: Endpoints,
    /// Login credentials.
    credentials: Credentials,
    /// `Accept-Language` tag.
    language: String,
    /// Bearer token; `None` until a login or refresh succeeds.
    token: Option<String>,
}

/// Builder for `TvdbClient`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct TvdbClientBuilder {
    user_name: Option<String>,
    user_key: Option<String>,
    api_key: Option<String>,
    credential_source: Box<dyn CredentialSource>,
    base_url: Option<Url>,
    language: Option<String>,
    user_agent: Option<String>,
    cache_backend: Option<CacheBackend>,
    expire_after: Option<Duration>,
}

impl TvdbClientBuilder {
    /// Creates a new builder reading missing credentials from the environment.
    fn new() -> Self {
        Self {
            user_name: None,
            user_key: None,
            api_key: None,
            credential_source: Box::new(EnvCredentials),
            base_url: None,
            language: None,
            user_agent: None,
            cache_backend: None,
            expire_after: None,
        }
    }

    /// Sets the account name.
    #[must_use]
    pub fn user_name(mut self, user_name: impl Into<String>) -> Self {
        self.user_name = Some(user_name.into());
        self
    }

    /// Sets the account secret key.
    #[must_use]
    pub fn user_key(mut self, user_key: impl Into<String>) -> Self {
        self.user_key = Some(user_key.into());
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets all three credentials at once.
    #[must_use]
    pub fn credentials(self, credentials: Credentials) -> Self {
        self.user_name(credentials.user_name)
            .user_key(credentials.user_key)
            .api_key(credentials.api_key)
    }

    /// Replaces where missing credentials are read from (default: environment).
    #[must_use]
    pub fn credential_source(mut self, source: impl CredentialSource + 'static) -> Self {
        self.credential_source = Box::new(source);
        self
    }

    /// Overrides the base URL (for wiremock in tests).
    #[must_use]
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Sets the `Accept-Language` tag (default: `en`).
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Sets the User-Agent (default: crate name and version).
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Selects the response cache backend (default: from the environment).
    #[must_use]
    pub fn cache_backend(mut self, backend: CacheBackend) -> Self {
        self.cache_backend = Some(backend);
        self
    }

    /// Sets how long responses stay cached (default: 6 hours).
    #[must_use]
    pub const fn expire_after(mut self, expire_after: Duration) -> Self {
        self.expire_after = Some(expire_after);
        self
    }

    /// Merges explicit credentials over the credential source and checks
    /// that none is empty.
    fn resolve_credentials(&self) -> Result<Credentials> {
        let explicit = Credentials::new(
            self.user_name.clone().unwrap_or_default(),
            self.user_key.clone().unwrap_or_default(),
            self.api_key.clone().unwrap_or_default(),
        );
        let credentials = explicit.or(self.credential_source.credentials());
        credentials.validate()?;
        Ok(credentials)
    }

    /// Builds the client over the cached `reqwest` transport and logs in.
    ///
    /// # Errors
    ///
    /// - Credentials are incomplete (`ConfigurationError`).
    /// - The cache store cannot be opened or purged.
    /// - `reqwest::Client` build fails.
    /// - The initial login fails at the transport level.
    pub async fn build(self) -> Result<TvdbClient> {
        let credentials = self.resolve_credentials()?;

        let backend = self.cache_backend.clone().unwrap_or_else(CacheBackend::from_env);
        let store = open_store(&backend).context("failed to open response cache")?;
        let user_agent = self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);
        let transport = CachedTransport::new(
            ReqwestTransport::new(user_agent)?,
            store,
            self.expire_after.unwrap_or(DEFAULT_EXPIRE_AFTER),
        )?;
        transport.purge_expired().await?;

        self.connect(credentials, transport).await
    }

    /// Builds the client over `transport` and logs in.
    ///
    /// Cache backend, expiry and User-Agent settings are ignored.
    ///
    /// # Errors
    ///
    /// - Credentials are incomplete (`ConfigurationError`).
    /// - The initial login fails at the transport level.
    pub async fn build_with_transport<T: LocalHttpTransport>(
        self,
        transport: T,
    ) -> Result<TvdbClient<T>> {
        let credentials = self.resolve_credentials()?;
        self.connect(credentials, transport).await
    }

    async fn connect<T: LocalHttpTransport>(
        self,
        credentials: Credentials,
        transport: T,
    ) -> Result<TvdbClient<T>> {
        let endpoints = match self.base_url {
            Some(url) => Endpoints::new(url),
            None => Endpoints::default_host()?,
        };

        let mut client = TvdbClient {
            transport,
            endpoints,
            credentials,
            language: self.language.unwrap_or_else(|| String::from(DEFAULT_LANGUAGE)),
            token: None,
        };
        client.login().await.context("initial login failed")?;
        Ok(client)
    }
}

impl TvdbClient<DefaultTransport> {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> TvdbClientBuilder {
        TvdbClientBuilder::new()
    }

    /// Evicts expired responses from the cache. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache store cannot be written.
    pub async fn purge_cache(&self) -> Result<usize> {
        self.transport.purge_expired().await
    }

    /// Drops every cached response. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache store cannot be written.
    pub async fn clear_cache(&self) -> Result<usize> {
        self.transport.clear().await
    }
}

impl<T> TvdbClient<T> {
    /// Current bearer token.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Endpoint registry the client sends requests to.
    #[must_use]
    pub const fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Headers sent with every request.
    #[must_use]
    pub fn session_headers(&self) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::new();
        headers.insert(
            String::from("Content-Type"),
            String::from("application/json"),
        );
        headers.insert(String::from("Accept"), String::from("application/json"));
        headers.insert(String::from("Accept-Language"), self.language.clone());
        if let Some(ref token) = self.token {
            headers.insert(String::from("Authorization"), format!("Bearer {token}"));
        }
        headers
    }

    /// Authentication parameters for login and refresh.
    #[must_use]
    pub fn user_params(&self) -> Vec<(String, String)> {
        let mut params = vec![(String::from("apikey"), self.credentials.api_key.clone())];
        if self.credentials.has_account() {
            params.push((String::from("userkey"), self.credentials.user_key.clone()));
            params.push((String::from("username"), self.credentials.user_name.clone()));
        }
        params
    }
}

impl<T: LocalHttpTransport> TvdbClient<T> {
    /// Sends the authentication parameters as a JSON body.
    async fn post(&self, url: Url) -> Result<ApiResponse> {
        let body: serde_json::Map<String, Value> = self
            .user_params()
            .into_iter()
            .map(|(name, value)| (name, Value::String(value)))
            .collect();
        let request = ApiRequest::post(url)
            .headers(self.session_headers())
            .json(Value::Object(body));
        self.transport.send(&request).await
    }

    async fn get(&self, url: Url, query: Vec<(String, String)>) -> Result<ApiResponse> {
        let request = ApiRequest::get(url)
            .headers(self.session_headers())
            .query(query);
        self.transport.send(&request).await
    }
}

/// Parses a JSON response body.
fn decode<D: DeserializeOwned>(response: &ApiResponse, what: &str) -> Result<D> {
    serde_json::from_str(&response.body)
        .with_context(|| format!("failed to decode JSON response: {what}"))
}

impl<T: LocalHttpTransport> LocalTvdbApi for TvdbClient<T> {
    #[instrument(skip_all)]
    async fn login(&mut self) -> Result<Option<String>> {
        tracing::info!(user_name = %self.credentials.user_name, "Logging in to TheTVDB");

        let url = self.endpoints.login()?;
        let response = self.post(url).await?;

        match response.status {
            STATUS_OK => {
                let body: TokenResponse = decode(&response, "login")?;
                self.token = Some(body.token);
            }
            STATUS_UNAUTHORIZED => {
                tracing::error!("Cannot log in to TheTVDB, trying to refresh token");
                match self.refresh_token().await? {
                    STATUS_OK => tracing::info!("Refreshed token"),
                    STATUS_UNAUTHORIZED => {
                        tracing::error!("JWT token is missing or expired");
                    }
                    _ => tracing::error!("Invalid credentials and/or API key"),
                }
            }
            status => {
                tracing::error!(status, body = %response.body, "Error while logging in");
            }
        }

        Ok(self.token.clone())
    }

    #[instrument(skip_all)]
    async fn refresh_token(&mut self) -> Result<u16> {
        let url = self.endpoints.refresh_token()?;
        let request = ApiRequest::get(url)
            .headers(self.session_headers())
            .query(self.user_params())
            .no_store();
        let response = self.transport.send(&request).await?;

        if response.status == STATUS_OK {
            let body: TokenResponse = decode(&response, "refresh_token")?;
            self.token = Some(body.token);
        } else {
            tracing::error!(
                status = response.status,
                body = %response.body,
                "Error while refreshing token"
            );
        }

        Ok(response.status)
    }

    #[instrument(skip_all)]
    async fn search(&self, name: &str) -> Result<Option<Vec<SeriesRecord>>> {
        let url = self.endpoints.search()?;
        let query = vec![(String::from("name"), String::from(name))];
        let response = self.get(url, query).await?;

        if response.status != STATUS_OK {
            tracing::error!(
                status = response.status,
                body = %response.body,
                "Error while searching series by name"
            );
            return Ok(None);
        }

        let body: DataResponse<Vec<SeriesRecord>> = decode(&response, "search/series")?;
        Ok(body.data)
    }

    #[instrument(skip_all)]
    async fn search_closest_matching(&self, name: &str) -> Result<Option<SeriesRecord>> {
        let Some(series) = self.search(name).await? else {
            return Ok(None);
        };
        Ok(closest_match(name, series))
    }

    #[instrument(skip_all)]
    async fn get_serie_by_id(&self, serie_id: u64) -> Result<Option<SeriesRecord>> {
        let url = self.endpoints.series_by_id(serie_id)?;
        let response = self.get(url, Vec::new()).await?;

        if response.status != STATUS_OK {
            tracing::error!(
                serie_id,
                status = response.status,
                body = %response.body,
                "Error while fetching series by id"
            );
            return Ok(None);
        }

        let body: DataResponse<SeriesRecord> = decode(&response, "series")?;
        Ok(body.data)
    }
}
