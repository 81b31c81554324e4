use serde::{Deserialize, Serialize};

use crate::blend::blend;
use crate::buckets::HourBucketIndex;
use crate::error::EngineResult;
use crate::models::InterpolatedPoint;
use crate::track::Track;

/// Estimates the weather at every timestamp of `track`.
///
/// Fails on the first timestamp that cannot be estimated; no partial result is returned.
pub fn interpolate_track(track: &Track, index: &HourBucketIndex) -> EngineResult<Vec<InterpolatedPoint>> {
    track
        .timestamps()
        .enumerate()
        .map(|(i, time)| blend(index, track.query_location(i), time))
        .collect()
}

/// Weather columns of one activity, each a comma-joined sequence with one value
/// per track timestamp.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct WeatherResult {
    pub activity_id: i64,
    pub temp: String,
    pub wet_bulb: String,
    pub wind_direction: String,
    pub wind_speed: String,
    pub apparent_temp: String,
    pub humidity: String,
    pub air_pressure: String,
}

impl WeatherResult {
    pub fn assemble(activity_id: i64, points: &[InterpolatedPoint]) -> Self {
        let column = |f: fn(&InterpolatedPoint) -> f64| {
            points
                .iter()
                .map(|p| format!("{:.1}", f(p)))
                .collect::<Vec<_>>()
                .join(", ")
        };

        Self {
            activity_id,
            temp: column(|p| p.temperature),
            wet_bulb: column(|p| p.wet_bulb),
            wind_direction: column(|p| p.wind_direction),
            wind_speed: column(|p| p.wind_speed),
            apparent_temp: column(|p| p.apparent_temperature),
            humidity: column(|p| p.relative_humidity),
            air_pressure: column(|p| p.surface_pressure),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::models::{HourlySeries, Location, Observation};
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(hour: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 7, 20)
            .unwrap()
            .and_hms_opt(hour, min, 0)
            .unwrap()
    }

    fn observation(time: NaiveDateTime, temperature: f64, wind_speed: f64) -> Observation {
        Observation {
            time,
            temperature,
            apparent_temperature: temperature + 1.0,
            relative_humidity: 50.0,
            surface_pressure: 1008.4,
            wind_speed,
            wind_direction: 200.0,
            weather_code: 1,
        }
    }

    fn two_hour_index() -> HourBucketIndex {
        let series = HourlySeries {
            grid_cell: Location::new(51.96, 4.2),
            observations: vec![observation(at(14, 0), 20.0, 10.0), observation(at(15, 0), 24.0, 14.0)],
        };
        HourBucketIndex::build([&series]).unwrap()
    }

    #[test]
    fn test_interpolate_track_end_to_end() {
        let track = Track::new(at(14, 0), vec![0, 1200, 2400, 3600], vec![Location::new(51.95, 4.21)]).unwrap();
        let points = interpolate_track(&track, &two_hour_index()).unwrap();

        assert_eq!(points.len(), 4);
        assert_eq!(points[0].temperature, 20.0);
        assert_eq!(points[0].wind_speed, 10.0);
        assert_eq!(points[0].wet_bulb, 13.7);
        assert_eq!(points[3].temperature, 24.0);
        assert_eq!(points[3].wind_speed, 14.0);
        // 20 minutes in: two thirds of the first hour, one third of the second
        assert_eq!(points[1].temperature, 21.3);
        assert_eq!(points[2].temperature, 22.7);
    }

    #[test]
    fn test_interpolate_track_fails_without_following_hour() {
        let track = Track::new(at(14, 0), vec![0, 4000], vec![Location::new(51.95, 4.21)]).unwrap();
        let err = interpolate_track(&track, &two_hour_index()).unwrap_err();
        assert_eq!(err, EngineError::MissingHourBucket { hour: at(16, 0) });
    }

    #[test]
    fn test_assemble_joins_columns() {
        let track = Track::new(at(14, 0), vec![0, 1800, 3600], vec![Location::new(51.95, 4.21)]).unwrap();
        let points = interpolate_track(&track, &two_hour_index()).unwrap();
        let result = WeatherResult::assemble(42, &points);

        assert_eq!(result.activity_id, 42);
        assert_eq!(result.temp, "20.0, 22.0, 24.0");
        assert_eq!(result.apparent_temp, "21.0, 23.0, 25.0");
        assert_eq!(result.wind_speed, "10.0, 12.0, 14.0");
        assert_eq!(result.wind_direction, "200.0, 200.0, 200.0");
        assert_eq!(result.humidity, "50.0, 50.0, 50.0");
        assert_eq!(result.air_pressure, "1008.4, 1008.4, 1008.4");
        assert_eq!(result.wet_bulb.split(", ").count(), 3);
    }
}
