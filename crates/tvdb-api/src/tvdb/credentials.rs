//! Account credentials and where they come from.

use std::fmt;

/// Environment variable holding the account name.
pub const USER_NAME_ENV: &str = "TVDB_USER_NAME";
/// Environment variable holding the account secret key.
pub const USER_KEY_ENV: &str = "TVDB_USER_KEY";
/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "TVDB_API_KEY";

/// Message of the error raised when credentials are incomplete.
pub const CONFIGURE_CREDENTIALS_ERROR_MESSAGE: &str = "TvdbClient couldn't be started due to wrong credentials. \
     Please review your settings and configure them properly.";

/// Remediation attached to the error raised when credentials are incomplete.
pub const CONFIGURE_CREDENTIALS_INSTRUCTIONS: &str = "You will need an API key from TheTVDB.com to access the client. \
     Register an account at https://thetvdb.com, request an API key, then set \
     TVDB_USER_NAME, TVDB_USER_KEY and TVDB_API_KEY (or the [credentials] \
     section of config.toml).";

/// The three values TheTVDB login needs.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Account name.
    pub user_name: String,
    /// Account secret key.
    pub user_key: String,
    /// API key.
    pub api_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |value: &str| if value.is_empty() { "" } else { "***" };
        f.debug_struct("Credentials")
            .field("user_name", &self.user_name)
            .field("user_key", &redact(&self.user_key))
            .field("api_key", &redact(&self.api_key))
            .finish()
    }
}

impl Credentials {
    /// Creates credentials from the three values.
    #[must_use]
    pub fn new(
        user_name: impl Into<String>,
        user_key: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            user_name: user_name.into(),
            user_key: user_key.into(),
            api_key: api_key.into(),
        }
    }

    /// Reads `TVDB_USER_NAME`, `TVDB_USER_KEY` and `TVDB_API_KEY`.
    /// Unset or non-UTF-8 variables read as empty.
    #[must_use]
    pub fn from_env() -> Self {
        let read = |name: &str| std::env::var(name).unwrap_or_default();
        Self {
            user_name: read(USER_NAME_ENV),
            user_key: read(USER_KEY_ENV),
            api_key: read(API_KEY_ENV),
        }
    }

    /// Fills each empty field from `fallback`.
    #[must_use]
    pub fn or(self, fallback: Self) -> Self {
        let pick = |own: String, other: String| if own.is_empty() { other } else { own };
        Self {
            user_name: pick(self.user_name, fallback.user_name),
            user_key: pick(self.user_key, fallback.user_key),
            api_key: pick(self.api_key, fallback.api_key),
        }
    }

    /// Names of the empty fields.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("user_name", &self.user_name),
            ("user_key", &self.user_key),
            ("api_key", &self.api_key),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    /// Checks that every field is set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` naming the empty fields.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigurationError::missing_credentials(missing))
        }
    }

    /// Whether the account fields go along with the API key.
    #[must_use]
    pub fn has_account(&self) -> bool {
        !self.user_name.is_empty() && !self.user_key.is_empty()
    }
}

/// Supplies credentials the caller did not pass explicitly.
pub trait CredentialSource: Send + Sync + fmt::Debug {
    /// Returns the configured credentials; fields may be empty.
    fn credentials(&self) -> Credentials;
}

/// Reads credentials from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl CredentialSource for EnvCredentials {
    fn credentials(&self) -> Credentials {
        Credentials::from_env()
    }
}

impl CredentialSource for Credentials {
    fn credentials(&self) -> Credentials {
        self.clone()
    }
}

/// Fatal error raised while constructing a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationError {
    message: String,
    instructions: String,
    missing: Vec<&'static str>,
}

impl ConfigurationError {
    /// Error for incomplete credentials.
    #[must_use]
    pub fn missing_credentials(missing: Vec<&'static str>) -> Self {
        Self {
            message: String::from(CONFIGURE_CREDENTIALS_ERROR_MESSAGE),
            instructions: String::from(CONFIGURE_CREDENTIALS_INSTRUCTIONS),
            missing,
        }
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// How to fix the configuration.
    #[must_use]
    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    /// Credential fields that were empty.
    #[must_use]
    pub fn missing_fields(&self) -> &[&'static str] {
        &self.missing
    }
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if !self.missing.is_empty() {
            write!(f, " (missing: {})", self.missing.join(", "))?;
        }
        write!(f, "\n{}", self.instructions)
    }
}

impl std::error::Error for ConfigurationError {}
