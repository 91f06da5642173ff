//! API client library for TheTVDB.
//!
//! Provides the authenticated TheTVDB client and the cache-aware HTTP
//! transport it sends requests through.

/// HTTP transport port and response cache facade.
pub mod http;

/// TheTVDB API client.
pub mod tvdb;
