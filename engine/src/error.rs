use chrono::NaiveDateTime;

/// Stull's approximation left its valid domain and produced a non-finite value.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("wet-bulb temperature is not finite for T={temperature}°C, RH={relative_humidity}%")]
pub struct WetBulbError {
    pub temperature: f64,
    pub relative_humidity: f64,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("track has no {0}")]
    EmptyTrack(&'static str),
    #[error("track elapsed time decreases at index {index}")]
    UnorderedTrack { index: usize },
    #[error("track elapsed time {seconds}s at index {index} is out of range")]
    TimeOutOfRange { index: usize, seconds: i64 },
    #[error("no weather observations for hour {hour}")]
    MissingHourBucket { hour: NaiveDateTime },
    #[error("hour bucket {hour} holds no samples")]
    EmptyBucket { hour: NaiveDateTime },
    #[error("numeric error at {time}: {source}")]
    NumericError {
        time: NaiveDateTime,
        #[source]
        source: WetBulbError,
    },
}

pub type EngineResult<T> = Result<T, EngineError>;
