//! Upstream API configuration.
//!
//! Loaded once at startup from the process environment and shared read-only
//! with every request afterwards.

use std::fmt;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use crate::error::{McpError, Result};

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "COMPLIANCE_API_KEY";
/// Environment variable holding the API secret.
pub const API_SECRET_VAR: &str = "COMPLIANCE_API_SECRET";
/// Environment variable overriding the API base URL.
pub const API_URL_VAR: &str = "COMPLIANCE_API_URL";

/// Base URL used when `COMPLIANCE_API_URL` is unset.
pub const DEFAULT_BASE_URL: &str = "https://api.example-compliance-platform.com";

/// Credentials and base URL for the compliance platform API.
#[derive(Clone)]
pub struct Config {
    api_key: String,
    api_secret: String,
    base_url: String,
}

impl Config {
    /// Build a configuration from explicit values.
    ///
    /// Fails if either credential is empty. An empty base URL selects
    /// [`DEFAULT_BASE_URL`].
    pub fn new(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        let api_key = api_key.into();
        let api_secret = api_secret.into();
        if api_key.is_empty() || api_secret.is_empty() {
            return Err(McpError::Config(format!(
                "{} and {} environment variables must be set",
                API_KEY_VAR, API_SECRET_VAR
            )));
        }

        let mut base_url = base_url.into();
        if base_url.is_empty() {
            base_url = DEFAULT_BASE_URL.to_string();
        }
        let base_url = base_url.trim_end_matches('/').to_string();

        Ok(Self {
            api_key,
            api_secret,
            base_url,
        })
    }

    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::new(
            lookup(API_KEY_VAR).unwrap_or_default(),
            lookup(API_SECRET_VAR).unwrap_or_default(),
            lookup(API_URL_VAR).unwrap_or_default(),
        )
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Value of the `Authorization` header: `"{key} {secret}"`.
    ///
    /// This is the platform's own scheme, not Bearer or Basic.
    pub fn authorization(&self) -> String {
        format!("{} {}", self.api_key, self.api_secret)
    }

    /// Headers attached to every upstream request.
    pub fn headers(&self) -> Result<HeaderMap> {
        let mut auth = HeaderValue::from_str(&self.authorization())
            .map_err(|_| McpError::Config("Invalid API key or secret format".to_string()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}
