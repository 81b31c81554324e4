use crate::error::WetBulbError;
use crate::models::{round1, Location};

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two locations in kilometers (haversine).
pub fn distance(a: Location, b: Location) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let d_lat = lat2 - lat1;
    let d_lon = (b.lon - a.lon).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Wet-bulb temperature in °C from air temperature (°C) and relative humidity (%),
/// using Stull's (2011) empirical fit. Rounded to one decimal.
pub fn wet_bulb(temperature: f64, relative_humidity: f64) -> Result<f64, WetBulbError> {
    let t = temperature;
    let rh = relative_humidity;
    let tw = t * (0.151977 * (rh + 8.313659).sqrt()).atan() + (t + rh).atan()
        - (rh - 1.676331).atan()
        + 0.00391838 * rh.powf(1.5) * (0.023101 * rh).atan()
        - 4.686035;

    if !tw.is_finite() {
        return Err(WetBulbError {
            temperature,
            relative_humidity,
        });
    }
    Ok(round1(tw))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROTTERDAM: Location = Location {
        lat: 51.9553,
        lon: 4.2129,
    };
    const AMSTERDAM: Location = Location {
        lat: 52.3676,
        lon: 4.9041,
    };

    // =========================================================================
    // distance
    // =========================================================================

    #[test]
    fn test_distance_to_self_is_zero() {
        for loc in [ROTTERDAM, AMSTERDAM, Location::new(-89.9, 179.9), Location::new(0.0, 0.0)] {
            assert_eq!(distance(loc, loc), 0.0);
        }
    }

    #[test]
    fn test_distance_is_symmetric() {
        let pairs = [
            (ROTTERDAM, AMSTERDAM),
            (Location::new(48.8566, 2.3522), Location::new(51.5074, -0.1278)),
            (Location::new(-33.86, 151.45), Location::new(-43.1, 147.3)),
        ];
        for (a, b) in pairs {
            assert_eq!(distance(a, b), distance(b, a));
        }
    }

    #[test]
    fn test_distance_known_values() {
        assert!((distance(ROTTERDAM, AMSTERDAM) - 65.762).abs() < 1e-3);
        // One degree of longitude on the equator
        let d = distance(Location::new(0.0, 0.0), Location::new(0.0, 1.0));
        assert!((d - 111.195).abs() < 1e-3);
    }

    // =========================================================================
    // wet_bulb
    // =========================================================================

    #[test]
    fn test_wet_bulb_golden_value() {
        assert_eq!(wet_bulb(20.0, 50.0).unwrap(), 13.7);
    }

    #[test]
    fn test_wet_bulb_other_conditions() {
        assert_eq!(wet_bulb(30.0, 80.0).unwrap(), 27.1);
        assert_eq!(wet_bulb(-10.0, 30.0).unwrap(), -11.9);
    }

    #[test]
    fn test_wet_bulb_out_of_domain_is_error() {
        let err = wet_bulb(25.0, -5.0).unwrap_err();
        assert_eq!(err.temperature, 25.0);
        assert_eq!(err.relative_humidity, -5.0);
    }

    #[test]
    fn test_wet_bulb_nan_input_is_error() {
        assert!(wet_bulb(f64::NAN, 50.0).is_err());
    }
}
