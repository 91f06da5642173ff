//! HTTP transport module.
//!
//! Defines the transport port the TheTVDB client sends requests through,
//! a `reqwest` implementation, and a caching decorator over any transport.

mod api;
mod cached;
mod client;
mod request;

#[allow(clippy::module_name_repetitions)]
pub use api::{HttpTransport, LocalHttpTransport};
pub use cached::{CachedTransport, DEFAULT_EXPIRE_AFTER};
pub use client::ReqwestTransport;
pub use request::{ApiRequest, ApiResponse};
