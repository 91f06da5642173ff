//! TheTVDB API client module.
//!
//! Handles login and token refresh against the TheTVDB JSON API and
//! retrieves series search results and series records.

mod api;
mod client;
mod credentials;
mod endpoints;
mod matching;
mod types;

#[allow(clippy::module_name_repetitions)]
pub use api::{LocalTvdbApi, TvdbApi};
#[allow(clippy::module_name_repetitions)]
pub use client::{DefaultTransport, TvdbClient, TvdbClientBuilder};
pub use credentials::{
    API_KEY_ENV, CONFIGURE_CREDENTIALS_ERROR_MESSAGE, CONFIGURE_CREDENTIALS_INSTRUCTIONS,
    ConfigurationError, CredentialSource, Credentials, EnvCredentials, USER_KEY_ENV,
    USER_NAME_ENV,
};
pub use endpoints::{DEFAULT_BASE_URL, Endpoints};
pub use matching::{DEFAULT_CUTOFF, closest_match};
pub use types::{SeriesRecord, series_name};
