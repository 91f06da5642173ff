//! `ReqwestTransport` - transport over a `reqwest` client.

use anyhow::{Context, Result};
use reqwest::Client;
use tracing::instrument;

use super::api::LocalHttpTransport;
use super::request::{ApiRequest, ApiResponse};

/// Transport that sends every request over the network.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    /// HTTP client (reqwest, gzip enabled).
    http_client: Client,
}

impl ReqwestTransport {
    /// Creates a transport identifying itself with `user_agent`.
    ///
    /// # Errors
    ///
    /// Returns an error if the `reqwest::Client` build fails.
    pub fn new(user_agent: &str) -> Result<Self> {
        let http_client = Client::builder()
            .user_agent(user_agent)
            .gzip(true)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { http_client })
    }
}

impl LocalHttpTransport for ReqwestTransport {
    #[instrument(skip_all, fields(method = %request.method))]
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let mut builder = self
            .http_client
            .request(request.method.clone(), request.url.clone());
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(ref body) = request.json {
            builder = builder.json(body);
        }

        let http_request = builder
            .build()
            .with_context(|| format!("failed to build request: {}", request.url))?;

        tracing::debug!(url = %http_request.url(), "TheTVDB API request");

        let result = self.http_client.execute(http_request).await;
        let response = result.with_context(|| format!("request failed: {}", request.url))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .with_context(|| format!("failed to read response body: {}", request.url))?;

        Ok(ApiResponse::new(status, body))
    }
}
