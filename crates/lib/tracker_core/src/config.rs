//! Client configuration.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::token_store::default_token_path;

/// Default API origin + prefix.
pub const DEFAULT_BASE_URL: &str = "https://trainee-miniproject-tracker-backend.onrender.com/app";

/// Per-attempt request budget.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Retries after the first attempt (3 attempts total).
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Base delay for linear backoff: retry N waits `N * base`.
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_millis(800);

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid base URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Configuration for the transport client and token storage.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Origin and path prefix every resource path is appended to.
    pub base_url: Url,
    /// Timeout applied to each attempt.
    pub timeout: Duration,
    /// Maximum number of retries on network failure or timeout.
    pub max_retries: u32,
    /// Base delay for linear retry backoff.
    pub retry_base_delay: Duration,
    /// File holding the persisted bearer token.
    pub token_path: PathBuf,
}

impl ClientConfig {
    /// Build a config for `base_url` with default timings and token path.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay: DEFAULT_RETRY_BASE_DELAY,
            token_path: default_token_path(),
        })
    }

    /// Reads configuration from environment variables with defaults.
    ///
    /// | Variable               | Default                                |
    /// |------------------------|----------------------------------------|
    /// | `TRACKER_API_URL`      | [`DEFAULT_BASE_URL`]                   |
    /// | `TRACKER_TIMEOUT_SECS` | `20`                                   |
    /// | `TRACKER_TOKEN_FILE`   | `<data dir>/mini-tracker/tpm_token`    |
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url =
            std::env::var("TRACKER_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let mut config = Self::new(&base_url)?;

        if let Ok(raw) = std::env::var("TRACKER_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "TRACKER_TIMEOUT_SECS",
                value: raw.clone(),
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Ok(path) = std::env::var("TRACKER_TOKEN_FILE")
            && !path.is_empty()
        {
            config.token_path = PathBuf::from(path);
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ConfigError> {
        self.base_url = parse_base_url(base_url)?;
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_base_delay = base_delay;
        self
    }

    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = path.into();
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: parse_base_url(DEFAULT_BASE_URL).expect("default base URL is valid"),
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay: DEFAULT_RETRY_BASE_DELAY,
            token_path: default_token_path(),
        }
    }
}

/// Parse a base URL, normalising it to end in `/` so relative joins keep the prefix.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim();
    let normalised = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    Url::parse(&normalised).map_err(|source| ConfigError::InvalidBaseUrl {
        url: raw.to_string(),
        source,
    })
}
