use std::time::Duration;

use thiserror::Error;

use crate::constants;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Session
    /// Value of the platform's `sessionid` cookie, supplied externally.
    pub session_id: String,
    pub user_agent: String,

    // Endpoints (overridable so tests can point at a mock server)
    pub graphql_url: String,
    pub rest_base_url: String,
    pub page_base_url: String,

    // Request pacing
    pub request_timeout: Duration,
    pub request_delay: Duration,
    pub proxy_url: Option<String>,

    // Acquisition bounds
    pub max_comments: usize,
    pub deep_merge_cap: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Session
            session_id: required_env("SESSION_ID")?,
            user_agent: env_or_default("USER_AGENT", constants::BROWSER_USER_AGENT),

            // Endpoints
            graphql_url: env_or_default("GRAPHQL_URL", constants::GRAPHQL_URL),
            rest_base_url: env_or_default("REST_BASE_URL", constants::REST_MEDIA_BASE_URL),
            page_base_url: env_or_default("PAGE_BASE_URL", constants::POST_PAGE_BASE_URL),

            // Request pacing
            request_timeout: Duration::from_secs(parse_env_u64("REQUEST_TIMEOUT_SECS", 30)?),
            request_delay: Duration::from_millis(parse_env_u64("REQUEST_DELAY_MS", 500)?),
            proxy_url: optional_env("PROXY_URL"),

            // Acquisition bounds
            max_comments: parse_env_usize("MAX_COMMENTS", 200)?,
            deep_merge_cap: parse_env_usize("DEEP_MERGE_CAP", constants::DEFAULT_MERGE_CAP)?,
        })
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session_id.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "SESSION_ID".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        if self.max_comments == 0 {
            return Err(ConfigError::InvalidValue {
                name: "MAX_COMMENTS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.deep_merge_cap == 0 {
            return Err(ConfigError::InvalidValue {
                name: "DEEP_MERGE_CAP".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "REQUEST_TIMEOUT_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Configuration with test-friendly defaults (no environment access,
    /// no inter-request delay).
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            session_id: "test-session".to_string(),
            user_agent: constants::BROWSER_USER_AGENT.to_string(),
            graphql_url: constants::GRAPHQL_URL.to_string(),
            rest_base_url: constants::REST_MEDIA_BASE_URL.to_string(),
            page_base_url: constants::POST_PAGE_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(10),
            request_delay: Duration::ZERO,
            proxy_url: None,
            max_comments: 200,
            deep_merge_cap: constants::DEFAULT_MERGE_CAP,
        }
    }
}

fn required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_usize(name: &str, default: usize) -> Result<usize, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}
