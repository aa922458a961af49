//! Analysis service configuration.
//!
//! The web build has no runtime configuration source, so the service is
//! chosen at compile time from environment variables:
//!
//! - `REUNITE_API_URL`: base URL of the HTTP analysis service. When
//!   unset, the simulated service is used.
//! - `REUNITE_API_TIMEOUT_MS`: request timeout for the HTTP service.

use serde::{Deserialize, Serialize};

/// Default latency of the simulated service, matching the demo delay.
pub const DEFAULT_SIMULATED_LATENCY_MS: u32 = 3_000;

/// Default HTTP request timeout.
pub const DEFAULT_TIMEOUT_MS: u32 = 30_000;

/// Errors that can occur while resolving a [`ServiceConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configured base URL is blank or not an http(s) URL.
    #[error("invalid analysis service URL: {0:?}")]
    InvalidBaseUrl(String),

    /// The timeout is not a positive integer number of milliseconds.
    #[error("invalid timeout {0:?}: expected a positive number of milliseconds")]
    InvalidTimeout(String),

    /// The JSON document could not be parsed.
    #[error("invalid service configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Which analysis service backs the workbenches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ServiceConfig {
    /// Canned answers after a fixed delay, for demos and development.
    Simulated {
        #[serde(default = "default_latency_ms")]
        latency_ms: u32,
    },
    /// JSON-over-HTTP analysis service.
    Http {
        base_url: String,
        #[serde(default = "default_timeout_ms")]
        timeout_ms: u32,
    },
}

const fn default_latency_ms() -> u32 {
    DEFAULT_SIMULATED_LATENCY_MS
}

const fn default_timeout_ms() -> u32 {
    DEFAULT_TIMEOUT_MS
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::Simulated {
            latency_ms: DEFAULT_SIMULATED_LATENCY_MS,
        }
    }
}

impl ServiceConfig {
    /// Resolve the configuration baked in at compile time.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the baked-in values are malformed.
    pub fn from_build_env() -> Result<Self, ConfigError> {
        Self::from_values(
            option_env!("REUNITE_API_URL"),
            option_env!("REUNITE_API_TIMEOUT_MS"),
        )
    }

    /// Resolve a configuration from optional URL and timeout strings.
    ///
    /// A missing or blank URL selects the simulated service; the timeout
    /// is then ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] or
    /// [`ConfigError::InvalidTimeout`] for malformed values.
    pub fn from_values(base_url: Option<&str>, timeout_ms: Option<&str>) -> Result<Self, ConfigError> {
        let Some(base_url) = base_url.map(str::trim).filter(|url| !url.is_empty()) else {
            return Ok(Self::default());
        };
        let timeout_ms = match timeout_ms.map(str::trim).filter(|t| !t.is_empty()) {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or_else(|| ConfigError::InvalidTimeout(raw.to_owned()))?,
            None => DEFAULT_TIMEOUT_MS,
        };
        Self::Http {
            base_url: base_url.to_owned(),
            timeout_ms,
        }
        .validated()
    }

    /// Parse a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] for unparseable input and the
    /// validation errors of [`from_values`](Self::from_values).
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str::<Self>(json)?.validated()
    }

    fn validated(self) -> Result<Self, ConfigError> {
        match self {
            Self::Http {
                base_url,
                timeout_ms,
            } => {
                let trimmed = base_url.trim().trim_end_matches('/');
                if !(trimmed.starts_with("http://") || trimmed.starts_with("https://"))
                    || trimmed.ends_with("//")
                {
                    return Err(ConfigError::InvalidBaseUrl(base_url));
                }
                if timeout_ms == 0 {
                    return Err(ConfigError::InvalidTimeout(timeout_ms.to_string()));
                }
                Ok(Self::Http {
                    base_url: trimmed.to_owned(),
                    timeout_ms,
                })
            }
            simulated @ Self::Simulated { .. } => Ok(simulated),
        }
    }
}
