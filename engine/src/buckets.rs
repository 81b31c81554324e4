use std::collections::BTreeMap;

use chrono::{NaiveDateTime, NaiveTime, TimeDelta, Timelike};

use crate::error::{EngineError, EngineResult};
use crate::geometry::wet_bulb;
use crate::models::{HourlySeries, Location, WeatherRecord};

/// `time` with minutes, seconds and sub-seconds zeroed.
pub fn hour_start(time: NaiveDateTime) -> NaiveDateTime {
    time.date().and_time(NaiveTime::MIN) + TimeDelta::hours(i64::from(time.hour()))
}

#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    pub location: Location,
    pub record: WeatherRecord,
}

/// Observations at one hour, keyed by the grid cell they were reported for.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HourBucket {
    samples: BTreeMap<String, Sample>,
}

impl HourBucket {
    /// Inserts a sample, returning the one it replaced for the same grid cell.
    pub fn insert(&mut self, key: String, sample: Sample) -> Option<Sample> {
        self.samples.insert(key, sample)
    }

    pub fn samples(&self) -> impl Iterator<Item = &Sample> {
        self.samples.values()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Hour-aligned timestamp to the samples observed at that hour.
///
/// Built once per activity from the series fetched at its sample locations.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HourBucketIndex {
    buckets: BTreeMap<NaiveDateTime, HourBucket>,
}

impl HourBucketIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build<'a, I>(series: I) -> EngineResult<Self>
    where
        I: IntoIterator<Item = &'a HourlySeries>,
    {
        let mut index = Self::new();
        for s in series {
            index.ingest(s)?;
        }
        log::debug!(
            "built weather index: {} hours, {} samples",
            index.len(),
            index.buckets.values().map(HourBucket::len).sum::<usize>()
        );
        Ok(index)
    }

    /// Adds every observation of `series`. A grid cell already present for an hour
    /// is overwritten. Returns the number of observations ingested.
    pub fn ingest(&mut self, series: &HourlySeries) -> EngineResult<usize> {
        let key = series.grid_cell.key();
        let mut replaced = 0;

        for obs in &series.observations {
            let hour = hour_start(obs.time);
            let wet_bulb = wet_bulb(obs.temperature, obs.relative_humidity)
                .map_err(|source| EngineError::NumericError { time: obs.time, source })?;

            let record = WeatherRecord {
                temperature: obs.temperature,
                wet_bulb,
                wind_direction: obs.wind_direction,
                wind_speed: obs.wind_speed,
                apparent_temperature: obs.apparent_temperature,
                relative_humidity: obs.relative_humidity,
                surface_pressure: obs.surface_pressure,
                weather_code: obs.weather_code,
            };
            let sample = Sample {
                location: series.grid_cell,
                record,
            };
            if self.buckets.entry(hour).or_default().insert(key.clone(), sample).is_some() {
                replaced += 1;
            }
        }

        if replaced > 0 {
            log::debug!("grid cell {} already indexed, replaced {} hours", key, replaced);
        }
        Ok(series.observations.len())
    }

    pub fn get(&self, hour: NaiveDateTime) -> Option<&HourBucket> {
        self.buckets.get(&hour)
    }

    pub fn hours(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        self.buckets.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
