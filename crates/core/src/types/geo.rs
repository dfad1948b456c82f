//! Geographic coordinates and great-circle distance.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used for distance calculations, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A WGS84 latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance to `other` in kilometres.
    #[must_use]
    pub fn distance_km(&self, other: &Self) -> f64 {
        haversine_km(self.latitude, self.longitude, other.latitude, other.longitude)
    }
}

/// Haversine great-circle distance between two points, in kilometres.
#[must_use]
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    const KANSAS_CITY: Coordinates = Coordinates::new(39.0997, -94.5786);
    const NEW_YORK: Coordinates = Coordinates::new(40.7128, -74.0060);

    #[test]
    fn test_identical_points_are_zero_apart() {
        assert!(KANSAS_CITY.distance_km(&KANSAS_CITY).abs() < f64::EPSILON);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let there = KANSAS_CITY.distance_km(&NEW_YORK);
        let back = NEW_YORK.distance_km(&KANSAS_CITY);
        assert!((there - back).abs() < 1e-9);
    }

    #[test]
    fn test_known_distance() {
        // Kansas City to New York is roughly 1,770 km.
        let d = KANSAS_CITY.distance_km(&NEW_YORK);
        assert!((1700.0..1850.0).contains(&d), "got {d}");
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let d = haversine_km(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111.19).abs() < 0.1, "got {d}");
    }

    #[test]
    fn test_half_degree_north_of_kansas_city_exceeds_fifty_km() {
        let d = haversine_km(39.0997, -94.5786, 39.0997 + 0.46, -94.5786);
        assert!(d > 50.0, "got {d}");
    }
}
