//! `HttpTransport` trait definition.
#![allow(clippy::future_not_send)]

use anyhow::Result;

use super::request::{ApiRequest, ApiResponse};

/// HTTP transport trait.
///
/// Sends one request and returns the status code and body, whatever the
/// status. Abstracts the network so the client can run over a cache, a
/// plain `reqwest` client, or a test double.
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(HttpTransport: Send)]
pub trait LocalHttpTransport {
    /// Sends `request`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent or the body cannot be read.
    /// Non-2xx statuses are not errors.
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse>;
}
