//! Inverse-distance weighting over the samples of one hour.
//!
//! Each sample contributes in proportion to `1 / d_i`, normalised so the weights sum
//! to one. This is the same weighting as `Π_{j≠i} d_j / Σ_k Π_{j≠k} d_j` without
//! forming the product of all distances.

use crate::buckets::{HourBucket, Sample};
use crate::geometry::distance;
use crate::models::{Location, WeatherRecord, ATTRIBUTE_COUNT};

#[derive(Clone, Debug, PartialEq)]
pub enum Weights {
    /// The query coincides with the sample at this position.
    Exact(usize),
    /// Normalised weight per sample, in sample order.
    Blend(Vec<f64>),
}

/// Normalised inverse-distance weights of `samples` seen from `query`.
pub fn weights(query: Location, samples: &[Location]) -> Weights {
    let distances: Vec<f64> = samples.iter().map(|s| distance(query, *s)).collect();

    if let Some(i) = distances.iter().position(|d| *d == 0.0) {
        return Weights::Exact(i);
    }

    let inverse: Vec<f64> = distances.iter().map(|d| 1.0 / d).collect();
    let total: f64 = inverse.iter().sum();
    Weights::Blend(inverse.into_iter().map(|w| w / total).collect())
}

/// Synthesises the record at `query` from one hour's samples.
///
/// Returns `None` for an empty bucket. The categorical weather code is taken from
/// the most heavily weighted (nearest) sample.
pub fn interpolate(query: Location, bucket: &HourBucket) -> Option<WeatherRecord> {
    let samples: Vec<&Sample> = bucket.samples().collect();
    if samples.is_empty() {
        return None;
    }
    let locations: Vec<Location> = samples.iter().map(|s| s.location).collect();

    match weights(query, &locations) {
        Weights::Exact(i) => Some(samples[i].record.clone()),
        Weights::Blend(weights) => {
            let mut values = [0.0; ATTRIBUTE_COUNT];
            for (sample, w) in samples.iter().zip(&weights) {
                for (acc, v) in values.iter_mut().zip(sample.record.attributes()) {
                    *acc += w * v;
                }
            }
            let nearest = weights
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map(|(i, _)| i)
                .unwrap_or(0);
            Some(WeatherRecord::from_attributes(values, samples[nearest].record.weather_code))
        }
    }
}
