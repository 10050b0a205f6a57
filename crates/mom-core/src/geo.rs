//! Coordinates and great-circle distance.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Reject coordinates outside the valid latitude/longitude ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Great-circle distance to `other` in kilometres.
    pub fn distance_km(&self, other: &Coordinate) -> f64 {
        haversine_km(self, other)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

/// Haversine distance between two points (km).
pub fn haversine_km(a: &Coordinate, b: &Coordinate) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Format a distance for display: whole metres below 1 km, else km with one decimal.
pub fn format_distance(km: f64) -> String {
    if km < 1.0 {
        format!("{}m", (km * 1000.0).round() as i64)
    } else {
        format!("{:.1}km", km)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARIS: Coordinate = Coordinate { lat: 48.8566, lng: 2.3522 };
    const LONDON: Coordinate = Coordinate { lat: 51.5074, lng: -0.1278 };

    #[test]
    fn test_same_point_is_zero() {
        assert_eq!(haversine_km(&PARIS, &PARIS), 0.0);
    }

    #[test]
    fn test_symmetric() {
        let ab = haversine_km(&PARIS, &LONDON);
        let ba = haversine_km(&LONDON, &PARIS);
        assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn test_known_distance() {
        let d = haversine_km(&PARIS, &LONDON);
        assert!((d - 343.5).abs() < 1.0, "got {d}");
    }

    #[test]
    fn test_format_distance() {
        assert_eq!(format_distance(0.5), "500m");
        assert_eq!(format_distance(1.5), "1.5km");
        assert_eq!(format_distance(0.0), "0m");
        assert_eq!(format_distance(12.34), "12.3km");
    }

    #[test]
    fn test_validity() {
        assert!(PARIS.is_valid());
        assert!(!Coordinate::new(91.0, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, f64::NAN).is_valid());
    }
}
