//! Open-Meteo client for hourly weather history.
//!
//! Recent days are served by the forecast API, older ones by the archive API.

use chrono::{NaiveDate, NaiveDateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use weather_engine::{HourlySeries, Location, Observation};

use crate::config::MeteoConfig;
use crate::retry::{with_retry, RetryConfig, RetryError};

pub const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
pub const ARCHIVE_URL: &str = "https://archive-api.open-meteo.com/v1/archive";

const HOURLY_FIELDS: &str = "temperature_2m,apparent_temperature,relative_humidity_2m,weather_code,\
                             wind_speed_10m,wind_direction_10m,surface_pressure";
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("rate limited by weather API")]
    RateLimited,
    #[error("weather API responded with {0}")]
    Status(StatusCode),
    #[error("weather API request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed weather response: {0}")]
    Malformed(String),
}

/// Source of hourly weather history for a location.
pub trait WeatherSource {
    async fn history(&self, location: Location, start: NaiveDate, end: NaiveDate) -> Result<HourlySeries, FetchError>;
}

pub struct OpenMeteo {
    client: reqwest::Client,
    forecast_url: String,
    archive_url: String,
    forecast_days: i64,
    retry: RetryConfig,
}

impl OpenMeteo {
    pub fn new(config: &MeteoConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            forecast_url: config.forecast_url.clone(),
            archive_url: config.archive_url.clone(),
            forecast_days: config.forecast_days,
            retry: config.retry(),
        })
    }

    /// Endpoint serving data starting at `start`, seen from `today`.
    pub fn endpoint(&self, start: NaiveDate, today: NaiveDate) -> &str {
        if (today - start).num_days() <= self.forecast_days {
            &self.forecast_url
        } else {
            &self.archive_url
        }
    }

    pub async fn history_at(
        &self,
        location: Location,
        start: NaiveDate,
        end: NaiveDate,
        today: NaiveDate,
    ) -> Result<HourlySeries, FetchError> {
        let url = self.endpoint(start, today);
        log::debug!("fetching weather at {} from {} ({} - {})", location.key(), url, start, end);

        let response = with_retry(|| self.request(url, location, start, end), &self.retry).await?;
        response.into_series()
    }

    async fn request(
        &self,
        url: &str,
        location: Location,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HistoryResponse, RetryError<FetchError>> {
        let response = self
            .client
            .get(url)
            .query(&[
                ("latitude", location.lat.to_string()),
                ("longitude", location.lon.to_string()),
                ("hourly", HOURLY_FIELDS.to_string()),
                ("start_date", start.to_string()),
                ("end_date", end.to_string()),
                ("timezone", "GMT".to_string()),
            ])
            .send()
            .await
            .map_err(|e| RetryError::Retryable(e.into()))?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::TOO_MANY_REQUESTS => {
                log::error!("weather API rate limit reached");
                return Err(RetryError::NonRetryable(FetchError::RateLimited));
            }
            status if status.is_server_error() => {
                return Err(RetryError::Retryable(FetchError::Status(status)));
            }
            status => return Err(RetryError::NonRetryable(FetchError::Status(status))),
        }

        response
            .json::<HistoryResponse>()
            .await
            .map_err(|e| RetryError::NonRetryable(FetchError::Malformed(e.to_string())))
    }
}

impl WeatherSource for OpenMeteo {
    async fn history(&self, location: Location, start: NaiveDate, end: NaiveDate) -> Result<HourlySeries, FetchError> {
        self.history_at(location, start, end, Utc::now().date_naive()).await
    }
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    latitude: f64,
    longitude: f64,
    hourly: Hourly,
}

#[derive(Debug, Deserialize)]
struct Hourly {
    time: Vec<String>,
    temperature_2m: Vec<Option<f64>>,
    apparent_temperature: Vec<Option<f64>>,
    relative_humidity_2m: Vec<Option<f64>>,
    surface_pressure: Vec<Option<f64>>,
    wind_speed_10m: Vec<Option<f64>>,
    wind_direction_10m: Vec<Option<f64>>,
    weather_code: Vec<Option<i32>>,
}

impl HistoryResponse {
    /// Converts the column-oriented response into observations. Hours with any
    /// missing value are left out.
    fn into_series(self) -> Result<HourlySeries, FetchError> {
        let h = &self.hourly;
        let n = h.time.len();
        let lengths = [
            h.temperature_2m.len(),
            h.apparent_temperature.len(),
            h.relative_humidity_2m.len(),
            h.surface_pressure.len(),
            h.wind_speed_10m.len(),
            h.wind_direction_10m.len(),
            h.weather_code.len(),
        ];
        if lengths.iter().any(|len| *len != n) {
            return Err(FetchError::Malformed(format!(
                "hourly columns have mismatched lengths: {} times, {:?}",
                n, lengths
            )));
        }

        let mut observations = Vec::with_capacity(n);
        let mut incomplete = 0;
        for i in 0..n {
            let time = NaiveDateTime::parse_from_str(&h.time[i], TIME_FORMAT)
                .map_err(|e| FetchError::Malformed(format!("time {:?}: {}", h.time[i], e)))?;

            let values = (
                h.temperature_2m[i],
                h.apparent_temperature[i],
                h.relative_humidity_2m[i],
                h.surface_pressure[i],
                h.wind_speed_10m[i],
                h.wind_direction_10m[i],
                h.weather_code[i],
            );
            match values {
                (Some(t), Some(at), Some(rh), Some(p), Some(ws), Some(wd), Some(code)) => {
                    observations.push(Observation {
                        time,
                        temperature: t,
                        apparent_temperature: at,
                        relative_humidity: rh,
                        surface_pressure: p,
                        wind_speed: ws,
                        wind_direction: wd,
                        weather_code: code,
                    });
                }
                _ => incomplete += 1,
            }
        }
        if incomplete > 0 {
            log::debug!(
                "dropped {} incomplete hours at {},{}",
                incomplete,
                self.latitude,
                self.longitude
            );
        }

        Ok(HourlySeries {
            grid_cell: Location::new(self.latitude, self.longitude),
            observations,
        })
    }
}
