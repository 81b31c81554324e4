use crate::models::Location;

/// Picks `count` query locations from a dense track at a fixed stride of `len / count`.
///
/// When the track is shorter than `count` the stride is zero and every pick is the
/// first location. Returns an empty list for an empty track.
pub fn select_samples(locations: &[Location], count: usize) -> Vec<Location> {
    if locations.is_empty() || count == 0 {
        return Vec::new();
    }
    let stride = locations.len() / count;
    (0..count).map(|i| locations[i * stride]).collect()
}
