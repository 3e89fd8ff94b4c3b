//! Configuration module for environment variable parsing.
//!
//! Reads all configuration from environment variables. A `.env` file in the
//! working directory is loaded first when present.

use std::env;
use std::fmt;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::ConfigError;

/// Default base URL of the LINE Messaging API.
pub const DEFAULT_API_BASE_URL: &str = "https://api.line.me";

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    /// Channel secret used as the HMAC key for webhook signatures
    pub channel_secret: String,

    /// Channel access token used to authenticate reply API calls
    pub channel_access_token: String,

    /// Port for the web server to listen on
    pub port: u16,

    /// Base URL of the Messaging API (overridable for tests and proxies)
    pub api_base_url: String,

    /// Deadline budget in milliseconds for all replies of one webhook batch
    pub reply_timeout_ms: u64,

    /// Maximum number of events dispatched concurrently within a batch
    pub dispatch_concurrency: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Fails when the channel secret or access token is missing or empty;
    /// the server must not start without them.
    pub fn from_env() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => debug!(path = %path.display(), "dotenv_loaded"),
            Err(e) => debug!(error = %e, "dotenv_not_loaded"),
        }

        Ok(Config {
            channel_secret: required("LINE_CHANNEL_SECRET")?,

            channel_access_token: required("LINE_CHANNEL_ACCESS_TOKEN")?,

            port: parse_or("PORT", 8080),

            api_base_url: env::var("LINE_API_BASE_URL")
                .ok()
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),

            reply_timeout_ms: parse_or("REPLY_TIMEOUT_MS", 5000),

            dispatch_concurrency: parse_or("DISPATCH_CONCURRENCY", 8usize).max(1),
        })
    }

    /// Reply deadline budget as a `Duration`.
    pub fn reply_timeout(&self) -> Duration {
        Duration::from_millis(self.reply_timeout_ms)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("channel_secret", &"<REDACTED>")
            .field("channel_access_token", &"<REDACTED>")
            .field("port", &self.port)
            .field("api_base_url", &self.api_base_url)
            .field("reply_timeout_ms", &self.reply_timeout_ms)
            .field("dispatch_concurrency", &self.dispatch_concurrency)
            .finish()
    }
}

/// Read a variable that must be present and non-blank.
fn required(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::Missing(name)),
    }
}

/// Parse a variable, falling back to `default` when unset or invalid.
fn parse_or<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().parse::<T>() {
        Ok(v) => v,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid value, using default");
            default
        }
    }
}
