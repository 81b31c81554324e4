//! Decoding of the stored time and location streams into a [`Track`].

use chrono::NaiveDateTime;
use weather_engine::{EngineError, Location, Track};

use crate::error::ActivityError;
use crate::models::ActivityStreams;

/// Parses `"0,1,2,..."` elapsed seconds.
///
/// An empty stream decodes to no timestamps. An empty field inside a non-empty
/// stream is an error.
pub fn decode_times(raw: &str) -> Result<Vec<i64>, String> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    raw.split(',')
        .map(str::trim)
        .enumerate()
        .map(|(i, s)| {
            if s.is_empty() {
                return Err(format!("empty elapsed time at position {}", i));
            }
            s.parse::<i64>().map_err(|e| format!("invalid elapsed time {:?}: {}", s, e))
        })
        .collect()
}

/// Parses `"[lat, lon],[lat, lon]"`, with or without an enclosing pair of brackets.
pub fn decode_locations(raw: &str) -> Result<Vec<Location>, String> {
    let cleaned: String = raw.chars().filter(|c| *c != '[' && *c != ']').collect();
    let values = cleaned
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f64>().map_err(|e| format!("invalid coordinate {:?}: {}", s, e)))
        .collect::<Result<Vec<f64>, String>>()?;

    if values.len() % 2 != 0 {
        return Err(format!("odd number of coordinates ({})", values.len()));
    }

    values
        .chunks_exact(2)
        .map(|pair| {
            let location = Location::new(pair[0], pair[1]);
            if location.is_valid() {
                Ok(location)
            } else {
                Err(format!("coordinate out of range: {},{}", pair[0], pair[1]))
            }
        })
        .collect()
}

impl ActivityStreams {
    pub fn track(&self, start_time: NaiveDateTime) -> Result<Track, ActivityError> {
        let id = self.activity_id;
        let time = self
            .time
            .as_deref()
            .ok_or_else(|| ActivityError::incomplete(id, "missing time stream"))?;
        let latlng = self
            .latlng
            .as_deref()
            .ok_or_else(|| ActivityError::incomplete(id, "missing location stream"))?;

        let elapsed = decode_times(time).map_err(|e| ActivityError::incomplete(id, e))?;
        let locations = decode_locations(latlng).map_err(|e| ActivityError::incomplete(id, e))?;

        Track::new(start_time, elapsed, locations).map_err(|e| match e {
            EngineError::EmptyTrack(_) | EngineError::UnorderedTrack { .. } | EngineError::TimeOutOfRange { .. } => {
                ActivityError::incomplete(id, e)
            }
            other => other.into(),
        })
    }
}
