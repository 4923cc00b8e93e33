// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used by
//! the client. Configuration is loaded from the environment once, at
//! application start, and injected into the services built from it.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `REWARDS_API_URL` | Base address of the rewards API | `http://localhost:5000/api` |
//! | `REWARDS_API_TIMEOUT_MS` | Default request deadline | `30000` |
//! | `REWARDS_API_RETRY_ATTEMPTS` | Total attempts for transient failures | `3` |
//! | `REWARDS_API_RETRY_BACKOFF_MS` | Base delay between attempts | `250` |
//! | `REWARDS_API_RETRY_UNSAFE` | Also retry POST/PATCH requests | `false` |
//! | `REWARDS_SESSION_FILE` | Durable session file (in-memory when unset) | unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::http::RetryPolicy;

/// Environment variable name for the API base address.
pub const API_URL_ENV: &str = "REWARDS_API_URL";

/// Environment variable name for the default request deadline, in milliseconds.
pub const TIMEOUT_MS_ENV: &str = "REWARDS_API_TIMEOUT_MS";

/// Environment variable name for the retry attempt ceiling.
pub const RETRY_ATTEMPTS_ENV: &str = "REWARDS_API_RETRY_ATTEMPTS";

/// Environment variable name for the base retry delay, in milliseconds.
pub const RETRY_BACKOFF_MS_ENV: &str = "REWARDS_API_RETRY_BACKOFF_MS";

/// Environment variable name for opting non-idempotent methods into retries.
pub const RETRY_UNSAFE_ENV: &str = "REWARDS_API_RETRY_UNSAFE";

/// Environment variable name for the durable session file.
///
/// When unset the session lives in memory and does not survive a restart.
pub const SESSION_FILE_ENV: &str = "REWARDS_SESSION_FILE";

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(250);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} is not a valid URL: {reason}")]
    InvalidUrl { name: &'static str, reason: String },

    #[error("{name} must be {expected}, got {value:?}")]
    InvalidValue {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base address every request path is appended to.
    pub base_url: Url,
    /// Default deadline for a single attempt; overridable per request.
    pub request_timeout: Duration,
    /// Retry behavior for transient failures.
    pub retry: RetryPolicy,
    /// Durable session file. `None` keeps the session in memory.
    pub session_file: Option<PathBuf>,
}

impl ClientConfig {
    /// Configuration with defaults for everything but the base address.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            request_timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
            session_file: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = Some(path.into());
        self
    }

    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let raw_url = read(API_URL_ENV).unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let base_url = Url::parse(&raw_url).map_err(|e| ConfigError::InvalidUrl {
            name: API_URL_ENV,
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidUrl {
                name: API_URL_ENV,
                reason: "URL cannot be used as a base".to_string(),
            });
        }

        let request_timeout = match read(TIMEOUT_MS_ENV) {
            Some(value) => Duration::from_millis(parse_positive(TIMEOUT_MS_ENV, &value)?),
            None => DEFAULT_TIMEOUT,
        };

        let max_attempts = match read(RETRY_ATTEMPTS_ENV) {
            Some(value) => u32::try_from(parse_positive(RETRY_ATTEMPTS_ENV, &value)?).map_err(
                |_| ConfigError::InvalidValue {
                    name: RETRY_ATTEMPTS_ENV,
                    expected: "a positive integer",
                    value: value.clone(),
                },
            )?,
            None => DEFAULT_RETRY_ATTEMPTS,
        };

        let base_delay = match read(RETRY_BACKOFF_MS_ENV) {
            Some(value) => Duration::from_millis(value.parse::<u64>().map_err(|_| {
                ConfigError::InvalidValue {
                    name: RETRY_BACKOFF_MS_ENV,
                    expected: "a non-negative integer",
                    value: value.clone(),
                }
            })?),
            None => DEFAULT_RETRY_BACKOFF,
        };

        let retry_unsafe = match read(RETRY_UNSAFE_ENV) {
            Some(value) => parse_bool(RETRY_UNSAFE_ENV, &value)?,
            None => false,
        };

        let retry = RetryPolicy::default()
            .with_max_attempts(max_attempts)
            .with_base_delay(base_delay)
            .with_retry_unsafe_methods(retry_unsafe);

        Ok(Self {
            base_url,
            request_timeout,
            retry,
            session_file: read(SESSION_FILE_ENV).map(PathBuf::from),
        })
    }
}

fn parse_positive(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.parse::<u64>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        _ => Err(ConfigError::InvalidValue {
            name,
            expected: "a positive integer",
            value: value.to_string(),
        }),
    }
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name,
            expected: "a boolean",
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.base_url.as_str(), "http://localhost:5000/api");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.retry.max_attempts(), 3);
        assert!(!config.retry.retries_unsafe_methods());
        assert!(config.session_file.is_none());
    }

    #[test]
    fn explicit_values_are_parsed() {
        let config = ClientConfig::from_lookup(lookup(&[
            (API_URL_ENV, "https://rewards.example.com/api/v2"),
            (TIMEOUT_MS_ENV, "1500"),
            (RETRY_ATTEMPTS_ENV, "5"),
            (RETRY_BACKOFF_MS_ENV, "0"),
            (RETRY_UNSAFE_ENV, "TRUE"),
            (SESSION_FILE_ENV, "/tmp/rewards-session.json"),
        ]))
        .unwrap();

        assert_eq!(config.base_url.host_str(), Some("rewards.example.com"));
        assert_eq!(config.request_timeout, Duration::from_millis(1500));
        assert_eq!(config.retry.max_attempts(), 5);
        assert_eq!(config.retry.base_delay(), Duration::ZERO);
        assert!(config.retry.retries_unsafe_methods());
        assert_eq!(
            config.session_file,
            Some(PathBuf::from("/tmp/rewards-session.json"))
        );
    }

    #[test]
    fn blank_values_are_treated_as_unset() {
        let config = ClientConfig::from_lookup(lookup(&[(TIMEOUT_MS_ENV, "   ")])).unwrap();
        assert_eq!(config.request_timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[(API_URL_ENV, "not a url")])),
            Err(ConfigError::InvalidUrl { .. })
        ));
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[(RETRY_ATTEMPTS_ENV, "0")])),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[(TIMEOUT_MS_ENV, "soon")])),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[(RETRY_UNSAFE_ENV, "maybe")])),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
