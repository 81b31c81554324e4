use chrono::{Days, NaiveDate, NaiveDateTime, TimeDelta};

use crate::error::{EngineError, EngineResult};
use crate::models::Location;
use crate::sampling::select_samples;

/// A recorded activity: a time stream of elapsed seconds and a location stream.
///
/// Both streams come from the recording device and are not required to have the
/// same length; the time stream drives the output.
#[derive(Clone, Debug, PartialEq)]
pub struct Track {
    start_time: NaiveDateTime,
    timestamps: Vec<NaiveDateTime>,
    locations: Vec<Location>,
}

impl Track {
    pub fn new(
        start_time: NaiveDateTime,
        elapsed_seconds: Vec<i64>,
        locations: Vec<Location>,
    ) -> EngineResult<Self> {
        if elapsed_seconds.is_empty() {
            return Err(EngineError::EmptyTrack("time stream"));
        }
        if locations.is_empty() {
            return Err(EngineError::EmptyTrack("location stream"));
        }
        if let Some(index) = elapsed_seconds.windows(2).position(|w| w[1] < w[0]) {
            return Err(EngineError::UnorderedTrack { index: index + 1 });
        }
        let timestamps = elapsed_seconds
            .iter()
            .enumerate()
            .map(|(index, &seconds)| {
                TimeDelta::try_seconds(seconds)
                    .and_then(|delta| start_time.checked_add_signed(delta))
                    .ok_or(EngineError::TimeOutOfRange { index, seconds })
            })
            .collect::<EngineResult<Vec<_>>>()?;
        Ok(Self {
            start_time,
            timestamps,
            locations,
        })
    }

    pub fn start_time(&self) -> NaiveDateTime {
        self.start_time
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    /// Number of timestamps, i.e. the length of every output sequence.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamp(&self, index: usize) -> NaiveDateTime {
        self.timestamps[index]
    }

    pub fn timestamps(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        self.timestamps.iter().copied()
    }

    pub fn end_time(&self) -> NaiveDateTime {
        // never empty once constructed
        self.timestamps.last().copied().unwrap_or(self.start_time)
    }

    /// Location used for time index `index`: the location at the same index, or the
    /// last known one once the location stream is exhausted.
    pub fn query_location(&self, index: usize) -> Location {
        self.locations[aligned_index(index, self.locations.len())]
    }

    pub fn sample_locations(&self, count: usize) -> Vec<Location> {
        select_samples(&self.locations, count)
    }

    /// Date range of weather to fetch. The end is one day past the last timestamp so
    /// the hour following the final sample is always covered.
    pub fn weather_window(&self) -> (NaiveDate, NaiveDate) {
        let start = self.start_time.date();
        let last = self.end_time().date();
        let end = last.checked_add_days(Days::new(1)).unwrap_or(last);
        (start, end)
    }
}

/// Clamps a time index onto a location stream of length `len`.
pub fn aligned_index(index: usize, len: usize) -> usize {
    index.min(len.saturating_sub(1))
}
