use weather_engine::{EngineError, Location};

use crate::open_meteo::FetchError;

/// Why an activity could not be enriched.
#[derive(thiserror::Error, Debug)]
pub enum ActivityError {
    #[error("activity {0} not found")]
    NotFound(i64),
    #[error("incomplete track data for activity {activity_id}: {reason}")]
    IncompleteTrackData { activity_id: i64, reason: String },
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("weather unavailable at {lat},{lon}: {source}", lat = .location.lat, lon = .location.lon)]
    UpstreamUnavailable {
        location: Location,
        #[source]
        source: FetchError,
    },
    #[error("store error: {0}")]
    Store(#[from] tokio_postgres::Error),
    #[error("store connection error: {0}")]
    Pool(#[from] bb8::RunError<tokio_postgres::Error>),
}

impl ActivityError {
    pub fn incomplete(activity_id: i64, reason: impl ToString) -> Self {
        ActivityError::IncompleteTrackData {
            activity_id,
            reason: reason.to_string(),
        }
    }

    /// Nothing to compute for this activity; not a failure of the run.
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            ActivityError::NotFound(_) | ActivityError::IncompleteTrackData { .. }
        )
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(
            self,
            ActivityError::UpstreamUnavailable {
                source: FetchError::RateLimited,
                ..
            }
        )
    }
}
