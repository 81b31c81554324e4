use std::time::Duration;

use serde::Deserialize;

use crate::open_meteo::{ARCHIVE_URL, FORECAST_URL};
use crate::retry::RetryConfig;

/// S3-compatible bucket holding per-database connection settings.
#[derive(Debug, Deserialize)]
pub struct SettingsStoreConfig {
    pub bucket: String,
    pub endpoint: String,
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
}

impl SettingsStoreConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed("WEATHER_SETTINGS_").from_env()
    }
}

#[derive(Debug, Deserialize)]
pub struct MeteoConfig {
    #[serde(default = "default_forecast_url")]
    pub forecast_url: String,
    #[serde(default = "default_archive_url")]
    pub archive_url: String,
    /// Queries starting at most this many days ago go to the forecast endpoint.
    #[serde(default = "default_forecast_days")]
    pub forecast_days: i64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

impl MeteoConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed("WEATHER_METEO_").from_env()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry(&self) -> RetryConfig {
        RetryConfig::new(self.max_retries, self.retry_base_delay_ms)
    }
}

impl Default for MeteoConfig {
    fn default() -> Self {
        Self {
            forecast_url: default_forecast_url(),
            archive_url: default_archive_url(),
            forecast_days: default_forecast_days(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BatchConfig {
    /// Number of locations along a track to fetch weather for.
    #[serde(default = "default_sample_count")]
    pub sample_count: usize,
    /// Pause before retrying a rate-limited activity. Unset halts the run instead.
    pub rate_limit_cooldown_secs: Option<u64>,
}

impl BatchConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed("WEATHER_BATCH_").from_env()
    }

    pub fn rate_limit_cooldown(&self) -> Option<Duration> {
        self.rate_limit_cooldown_secs.map(Duration::from_secs)
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            sample_count: default_sample_count(),
            rate_limit_cooldown_secs: None,
        }
    }
}

fn default_forecast_url() -> String {
    FORECAST_URL.to_string()
}

fn default_archive_url() -> String {
    ARCHIVE_URL.to_string()
}

fn default_forecast_days() -> i64 {
    6
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    5
}

fn default_retry_base_delay_ms() -> u64 {
    1000
}

fn default_sample_count() -> usize {
    weather_engine::DEFAULT_SAMPLE_COUNT
}
