//! `CachedTransport` - response cache in front of another transport.
#![allow(clippy::future_not_send)]

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{TimeDelta, Utc};
use tokio::sync::Mutex;
use tracing::instrument;
use tvdb_cache::{CacheStore, CachedResponse};

use super::api::LocalHttpTransport;
use super::request::{ApiRequest, ApiResponse};

/// Default retention window for cached responses (6 hours).
pub const DEFAULT_EXPIRE_AFTER: Duration = Duration::from_secs(21_600);

/// Only successful responses are stored.
const CACHEABLE_STATUS: u16 = 200;

/// Transport decorator that serves repeated `GET` requests from a store.
#[derive(Debug)]
pub struct CachedTransport<T> {
    /// Transport used on cache misses.
    inner: T,
    /// Response store.
    store: Mutex<Box<dyn CacheStore>>,
    /// Retention window for new entries.
    expire_after: TimeDelta,
}

impl<T> CachedTransport<T> {
    /// Wraps `inner`, storing responses in `store` for `expire_after`.
    ///
    /// # Errors
    ///
    /// Returns an error if `expire_after` does not fit a `chrono::TimeDelta`.
    pub fn new(inner: T, store: Box<dyn CacheStore>, expire_after: Duration) -> Result<Self> {
        let expire_after =
            TimeDelta::from_std(expire_after).context("cache expire_after is out of range")?;
        Ok(Self {
            inner,
            store: Mutex::new(store),
            expire_after,
        })
    }

    /// Evicts expired entries. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub async fn purge_expired(&self) -> Result<usize> {
        let removed = self
            .store
            .lock()
            .await
            .purge_expired(Utc::now())
            .context("failed to purge expired responses")?;
        if removed > 0 {
            tracing::info!(removed, "Removed expired cached responses");
        }
        Ok(removed)
    }

    /// Drops every cached response. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub async fn clear(&self) -> Result<usize> {
        let removed = self
            .store
            .lock()
            .await
            .clear()
            .context("failed to clear response cache")?;
        tracing::info!(removed, "Cleared cached responses");
        Ok(removed)
    }
}

impl<T: LocalHttpTransport> LocalHttpTransport for CachedTransport<T> {
    #[instrument(skip_all)]
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        if !request.is_cacheable() {
            return self.inner.send(request).await;
        }

        let key = request.cache_key();
        let now = Utc::now();

        let cached = self
            .store
            .lock()
            .await
            .get(&key, now)
            .context("failed to read response cache")?;
        if let Some(hit) = cached {
            tracing::debug!(url = %request.url, status = hit.status, "Serving response from cache");
            return Ok(ApiResponse {
                status: hit.status,
                body: hit.body,
                from_cache: true,
            });
        }

        let response = self.inner.send(request).await?;

        if response.status == CACHEABLE_STATUS {
            let entry = CachedResponse::new(
                response.status,
                response.body.clone(),
                now,
                self.expire_after,
            );
            self.store
                .lock()
                .await
                .put(&key, entry)
                .context("failed to write response cache")?;
        }

        Ok(response)
    }
}
