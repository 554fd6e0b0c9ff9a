use std::env;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;

use crate::range::{Preset, TimeRange};
use crate::tempestd::models::UnitSystem;

#[derive(Debug, Clone)]
pub struct Config {
    // tempestd API
    pub server_url: Url,
    pub request_timeout_seconds: u64,

    // Session defaults
    pub default_units: UnitSystem,
    pub default_range: Preset,
    pub station_id: Option<u32>,

    // Refresh settings
    pub poll_interval_seconds: u64,
    pub freshness_window_seconds: u64,
    pub disconnect_after_failures: u32,
    pub fetch_history: bool,

    // Plugins
    pub plugins_manifest: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if `TEMPESTD_URL` is not set and
    /// `ConfigError::Invalid` if a value cannot be interpreted.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let raw_url =
            env::var("TEMPESTD_URL").map_err(|_| ConfigError::Missing("TEMPESTD_URL"))?;

        Ok(Self {
            // tempestd API
            server_url: parse_server_url(&raw_url)?,
            request_timeout_seconds: env::var("REQUEST_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),

            // Session defaults
            default_units: env::var("TEMPEST_UNITS")
                .unwrap_or_else(|_| "metric".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("TEMPEST_UNITS"))?,
            default_range: env::var("TEMPEST_RANGE")
                .unwrap_or_else(|_| "24h".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("TEMPEST_RANGE"))?,
            station_id: match env::var("TEMPEST_STATION_ID") {
                Ok(raw) => Some(
                    raw.parse()
                        .map_err(|_| ConfigError::Invalid("TEMPEST_STATION_ID"))?,
                ),
                Err(_) => None,
            },

            // Refresh settings
            poll_interval_seconds: env::var("POLL_INTERVAL_SECONDS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap_or(60),
            freshness_window_seconds: env::var("FRESHNESS_WINDOW_SECONDS")
                .unwrap_or_else(|_| "180".to_string())
                .parse()
                .unwrap_or(180),
            disconnect_after_failures: env::var("DISCONNECT_AFTER_FAILURES")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .unwrap_or(3),
            fetch_history: env::var("FETCH_HISTORY")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),

            // Plugins
            plugins_manifest: env::var("PLUGINS_MANIFEST").ok().map(PathBuf::from),
        })
    }

    /// Configuration pointing at `server_url` with every other setting at its default.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the URL is not absolute.
    pub fn with_server(server_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            server_url: parse_server_url(server_url)?,
            request_timeout_seconds: 30,
            default_units: UnitSystem::Metric,
            default_range: Preset::Day,
            station_id: None,
            poll_interval_seconds: 60,
            freshness_window_seconds: 180,
            disconnect_after_failures: 3,
            fetch_history: true,
            plugins_manifest: None,
        })
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds.max(1))
    }

    #[must_use]
    pub fn freshness_window(&self) -> chrono::Duration {
        i64::try_from(self.freshness_window_seconds)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }

    #[must_use]
    pub fn default_time_range(&self) -> TimeRange {
        TimeRange::Preset(self.default_range)
    }
}

/// Parse a server URL and keep only its origin.
fn parse_server_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|_| ConfigError::Invalid("TEMPESTD_URL"))?;
    if !url.has_host() {
        return Err(ConfigError::Invalid("TEMPESTD_URL"));
    }
    let origin = url.origin().ascii_serialization();
    Url::parse(&origin).map_err(|_| ConfigError::Invalid("TEMPESTD_URL"))
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
