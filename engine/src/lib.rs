//! Spatiotemporal weather interpolation for recorded activity tracks.
//!
//! Sparse hourly observations fetched at a handful of points along a track
//! are organised per hour, blended in space with inverse-distance weighting
//! and in time between the two bounding hours, giving an estimate for every
//! timestamp of the track.
//!
//! The crate does no I/O: callers fetch the hourly series and hand them over.

pub mod assemble;
pub mod blend;
pub mod buckets;
pub mod error;
pub mod geometry;
pub mod idw;
pub mod models;
pub mod sampling;
pub mod track;

pub use assemble::{interpolate_track, WeatherResult};
pub use buckets::{HourBucket, HourBucketIndex, Sample};
pub use error::{EngineError, WetBulbError};
pub use models::{HourlySeries, InterpolatedPoint, Location, Observation, WeatherRecord};
pub use track::Track;

/// Number of weather samples taken along a track when nothing else is configured.
pub const DEFAULT_SAMPLE_COUNT: usize = 10;
