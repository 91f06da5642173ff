//! Request and response values passed through the transport.

use std::collections::BTreeMap;

use reqwest::Method;
use sha2::{Digest, Sha256};
use url::Url;

/// An outgoing API request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL without query.
    pub url: Url,
    /// Request headers, sorted by name.
    pub headers: BTreeMap<String, String>,
    /// Query parameters in send order.
    pub query: Vec<(String, String)>,
    /// JSON body.
    pub json: Option<serde_json::Value>,
    /// Never serve or store this request through a cache.
    pub no_store: bool,
}

impl ApiRequest {
    /// Creates a request with no headers, query or body.
    #[must_use]
    pub const fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: BTreeMap::new(),
            query: Vec::new(),
            json: None,
            no_store: false,
        }
    }

    /// Creates a `GET` request.
    #[must_use]
    pub const fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Creates a `POST` request.
    #[must_use]
    pub const fn post(url: Url) -> Self {
        Self::new(Method::POST, url)
    }

    /// Replaces the headers.
    #[must_use]
    pub fn headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    /// Replaces the query parameters.
    #[must_use]
    pub fn query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    /// Sets the JSON body.
    #[must_use]
    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.json = Some(body);
        self
    }

    /// Marks the request as uncacheable.
    #[must_use]
    pub const fn no_store(mut self) -> Self {
        self.no_store = true;
        self
    }

    /// Only `GET` responses may be served from the cache.
    #[must_use]
    pub fn is_cacheable(&self) -> bool {
        self.method == Method::GET && !self.no_store
    }

    /// Identity of the request for cache lookups: hex SHA-256 of
    /// [`Self::canonical_form`].
    ///
    /// Hashed so that tokens in headers never reach the store.
    #[must_use]
    pub fn cache_key(&self) -> String {
        format!("{:x}", Sha256::digest(self.canonical_form().as_bytes()))
    }

    /// Method, URL, query, headers and body, one per line.
    ///
    /// Query parameters are sorted so that order does not split entries.
    fn canonical_form(&self) -> String {
        let mut query = self.query.clone();
        query.sort();

        let mut parts = vec![format!("{} {}", self.method, self.url)];
        parts.extend(query.iter().map(|(k, v)| format!("query:{k}={v}")));
        parts.extend(self.headers.iter().map(|(k, v)| format!("header:{k}={v}")));
        if let Some(ref body) = self.json {
            parts.push(format!("body:{body}"));
        }
        parts.join("\n")
    }
}

/// A response as seen by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw body.
    pub body: String,
    /// `true` when served from the response cache.
    pub from_cache: bool,
}

impl ApiResponse {
    /// Creates a response that came from the network.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            from_cache: false,
        }
    }
}
