use chrono::{NaiveDateTime, TimeDelta};

use crate::buckets::{hour_start, HourBucketIndex};
use crate::error::{EngineError, EngineResult};
use crate::idw;
use crate::models::{InterpolatedPoint, Location, WeatherRecord, ATTRIBUTE_COUNT};

const SECONDS_PER_HOUR: f64 = 3600.0;

/// The two hours bounding a timestamp and the linear weight of each.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HourWeights {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub start_weight: f64,
    pub end_weight: f64,
}

pub fn hour_weights(time: NaiveDateTime) -> HourWeights {
    let start = hour_start(time);
    let end = start + TimeDelta::hours(1);
    let elapsed = (time - start).num_milliseconds() as f64 / 1000.0;
    let remaining = (end - time).num_milliseconds() as f64 / 1000.0;

    HourWeights {
        start,
        end,
        start_weight: (SECONDS_PER_HOUR - elapsed) / SECONDS_PER_HOUR,
        end_weight: (SECONDS_PER_HOUR - remaining) / SECONDS_PER_HOUR,
    }
}

/// Estimated conditions at `query` and `time`, blending the spatial estimates of the
/// two bounding hours.
///
/// An hour with zero weight is not consulted, so a timestamp exactly on the hour
/// only needs that hour's observations. This deliberately relaxes the rule that both
/// bounding hours must be present: only an hour that contributes is required.
pub fn blend(index: &HourBucketIndex, query: Location, time: NaiveDateTime) -> EngineResult<InterpolatedPoint> {
    let weights = hour_weights(time);
    let mut values = [0.0; ATTRIBUTE_COUNT];

    for (hour, weight) in [
        (weights.start, weights.start_weight),
        (weights.end, weights.end_weight),
    ] {
        if weight == 0.0 {
            continue;
        }
        let record = spatial(index, query, hour)?;
        for (acc, v) in values.iter_mut().zip(record.attributes()) {
            *acc += weight * v;
        }
    }

    Ok(InterpolatedPoint::from_attributes(values))
}

fn spatial(index: &HourBucketIndex, query: Location, hour: NaiveDateTime) -> EngineResult<WeatherRecord> {
    let bucket = index
        .get(hour)
        .ok_or(EngineError::MissingHourBucket { hour })?;
    idw::interpolate(query, bucket).ok_or(EngineError::EmptyBucket { hour })
}
