use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Number of blended scalar attributes carried by a record.
pub const ATTRIBUTE_COUNT: usize = 7;

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }

    /// Canonical `lat,lon` key, as the weather source reports its grid cell.
    pub fn key(&self) -> String {
        format!("{},{}", self.lat, self.lon)
    }
}

/// One hourly observation as delivered by the weather source.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Observation {
    pub time: NaiveDateTime,
    pub temperature: f64,
    pub apparent_temperature: f64,
    pub relative_humidity: f64,
    pub surface_pressure: f64,
    pub wind_speed: f64,
    pub wind_direction: f64,
    pub weather_code: i32,
}

/// Hourly observations for the grid cell the source resolved a query location to.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct HourlySeries {
    pub grid_cell: Location,
    pub observations: Vec<Observation>,
}

/// Weather attributes at one place and hour, including the derived wet-bulb temperature.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct WeatherRecord {
    pub temperature: f64,
    pub wet_bulb: f64,
    pub wind_direction: f64,
    pub wind_speed: f64,
    pub apparent_temperature: f64,
    pub relative_humidity: f64,
    pub surface_pressure: f64,
    pub weather_code: i32,
}

impl WeatherRecord {
    /// Numeric attributes in output order. The weather code is categorical and left out.
    pub fn attributes(&self) -> [f64; ATTRIBUTE_COUNT] {
        [
            self.temperature,
            self.wet_bulb,
            self.wind_direction,
            self.wind_speed,
            self.apparent_temperature,
            self.relative_humidity,
            self.surface_pressure,
        ]
    }

    pub fn from_attributes(values: [f64; ATTRIBUTE_COUNT], weather_code: i32) -> Self {
        let [temperature, wet_bulb, wind_direction, wind_speed, apparent_temperature, relative_humidity, surface_pressure] =
            values;
        Self {
            temperature,
            wet_bulb,
            wind_direction,
            wind_speed,
            apparent_temperature,
            relative_humidity,
            surface_pressure,
            weather_code,
        }
    }
}

/// Estimated conditions at one timestamp of a track, rounded to one decimal.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct InterpolatedPoint {
    pub temperature: f64,
    pub wet_bulb: f64,
    pub wind_direction: f64,
    pub wind_speed: f64,
    pub apparent_temperature: f64,
    pub relative_humidity: f64,
    pub surface_pressure: f64,
}

impl InterpolatedPoint {
    pub fn from_attributes(values: [f64; ATTRIBUTE_COUNT]) -> Self {
        let [temperature, wet_bulb, wind_direction, wind_speed, apparent_temperature, relative_humidity, surface_pressure] =
            values.map(round1);
        Self {
            temperature,
            wet_bulb,
            wind_direction,
            wind_speed,
            apparent_temperature,
            relative_humidity,
            surface_pressure,
        }
    }
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
