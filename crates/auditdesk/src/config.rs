//! Configuration management for auditdesk.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::search::{SearchOptions, MAX_RESULTS, MIN_QUERY_LENGTH};
use crate::trend::{TrendOptions, DEFAULT_WINDOW_DAYS, FULL_SPAN_DAYS};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default configuration directory name.
const CONFIG_DIR_NAME: &str = "auditdesk";

/// Prefix for environment overrides, e.g. `AUDITDESK_API__BASE_URL`.
const ENV_PREFIX: &str = "AUDITDESK_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `AUDITDESK_`, sections split on `__`)
/// 2. TOML config file at `~/.config/auditdesk/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API connection configuration.
    pub api: ApiConfig,
    /// Search configuration.
    pub search: SearchConfig,
    /// Trend configuration.
    pub trend: TrendConfig,
    /// UI state defaults.
    pub ui: UiConfig,
}

/// API connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Root URL of the REST API.
    pub base_url: String,
    /// Bearer token sent with every request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
    /// Connection timeout in seconds.
    pub connect_timeout_secs: u64,
}

/// Search settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Minimum trimmed query length before any request is made. May be
    /// raised above 2, never lowered.
    pub min_query_length: usize,
    /// Maximum number of results shown. May be lowered below 10, never
    /// raised.
    pub max_results: usize,
    /// Quiet period before an interactive search runs, in milliseconds.
    pub debounce_ms: u64,
}

/// Trend settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    /// Number of most recent days shown.
    pub window_days: u32,
    /// Number of days before today that are bucketed.
    pub span_days: u32,
}

/// UI state defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Start with the dark theme.
    pub dark_theme: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api/v1".to_string(),
            token: None,
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_query_length: MIN_QUERY_LENGTH,
            max_results: MAX_RESULTS,
            debounce_ms: 300,
        }
    }
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_WINDOW_DAYS,
            span_days: FULL_SPAN_DAYS,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        match reqwest::Url::parse(&self.api.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => {
                return Err(Error::config_validation(format!(
                    "api.base_url must use http or https, got {}",
                    url.scheme()
                )));
            }
            Err(e) => {
                return Err(Error::config_validation(format!(
                    "api.base_url is not a valid URL ({}): {e}",
                    self.api.base_url
                )));
            }
        }

        if self.api.timeout_secs == 0 || self.api.connect_timeout_secs == 0 {
            return Err(Error::config_validation("api timeouts must be greater than 0"));
        }

        if self.search.min_query_length < MIN_QUERY_LENGTH {
            return Err(Error::config_validation(format!(
                "search.min_query_length must be at least {MIN_QUERY_LENGTH}, got {}",
                self.search.min_query_length
            )));
        }

        if !(1..=MAX_RESULTS).contains(&self.search.max_results) {
            return Err(Error::config_validation(format!(
                "search.max_results must be between 1 and {MAX_RESULTS}, got {}",
                self.search.max_results
            )));
        }

        if self.trend.window_days == 0 {
            return Err(Error::config_validation("trend.window_days must be greater than 0"));
        }

        if self.trend.window_days > self.trend.span_days.saturating_add(1) {
            return Err(Error::config_validation(format!(
                "trend.window_days ({}) cannot exceed span_days + 1 ({})",
                self.trend.window_days,
                self.trend.span_days.saturating_add(1)
            )));
        }

        Ok(())
    }

    /// Search limits derived from the configuration.
    #[must_use]
    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            min_query_length: self.search.min_query_length,
            max_results: self.search.max_results,
        }
    }

    /// Trend window derived from the configuration.
    #[must_use]
    pub fn trend_options(&self) -> TrendOptions {
        TrendOptions {
            window_days: self.trend.window_days,
            span_days: self.trend.span_days,
        }
    }

    /// Get the debounce period as a Duration.
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.search.debounce_ms)
    }
}
