//! [`GeoPoint`] and the spherical-earth helpers the enforcer relies on.
//!
//! Headings use the standard initial great-circle bearing, not a planar
//! angle, so that long legs at high latitude are still steered correctly.
//!
//! # Example
//!
//! ```
//! use wayguard_types::GeoPoint;
//!
//! let origin = GeoPoint::new(0.0, 0.0);
//! let north = GeoPoint::new(1.0, 0.0);
//! assert!(origin.bearing_to(&north).abs() < 1e-9);
//! assert!((origin.distance_to(&north) - 111_195.0).abs() < 10.0);
//! ```

use serde::{Deserialize, Serialize};

/// Mean earth radius in metres (IUGG).
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A WGS-84 style coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Metres above the reference surface; ignored by bearing and distance.
    #[serde(default)]
    pub altitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude: 0.0,
        }
    }

    /// Builder-style altitude override.
    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = altitude;
        self
    }

    /// `true` when every component is finite and latitude/longitude are in
    /// range.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.altitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Initial great-circle bearing from `self` to `other`, in `[0, 360)`.
    ///
    /// Coincident points yield `0.0`.
    pub fn bearing_to(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let delta_lon = (other.longitude - self.longitude).to_radians();

        let x = delta_lon.sin() * lat2.cos();
        let y = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();

        x.atan2(y).to_degrees().rem_euclid(360.0)
    }

    /// Haversine distance to `other` in metres.
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let delta_lat = lat2 - lat1;
        let delta_lon = (other.longitude - self.longitude).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
    }
}

/// Shortest angular distance between two headings, in `[0, 180]`.
///
/// `359°` and `1°` are `2°` apart.  Non-finite input yields `NaN`.
pub fn circular_difference(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    d.min(360.0 - d)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    #[test]
    fn cardinal_bearings_at_equator() {
        let origin = GeoPoint::new(0.0, 0.0);
        assert!((origin.bearing_to(&GeoPoint::new(1.0, 0.0)) - 0.0).abs() < EPS);
        assert!((origin.bearing_to(&GeoPoint::new(0.0, 1.0)) - 90.0).abs() < EPS);
        assert!((origin.bearing_to(&GeoPoint::new(-1.0, 0.0)) - 180.0).abs() < EPS);
        assert!((origin.bearing_to(&GeoPoint::new(0.0, -1.0)) - 270.0).abs() < EPS);
    }

    #[test]
    fn great_circle_bearing_differs_from_planar_at_high_latitude() {
        // Due "east" on the map at 60°N: the great-circle heading starts
        // north of east.
        let from = GeoPoint::new(60.0, 0.0);
        let to = GeoPoint::new(60.0, 10.0);
        let bearing = from.bearing_to(&to);
        assert!(bearing < 90.0 && bearing > 80.0, "got {bearing}");
    }

    #[test]
    fn bearing_is_normalised_into_range() {
        let from = GeoPoint::new(55.0, 37.0);
        let to = GeoPoint::new(55.1, 36.9);
        let bearing = from.bearing_to(&to);
        assert!((0.0..360.0).contains(&bearing));
        assert!(bearing > 270.0);
    }

    #[test]
    fn coincident_points_have_zero_bearing_and_distance() {
        let p = GeoPoint::new(12.5, -45.25);
        assert_eq!(p.bearing_to(&p), 0.0);
        assert!(p.distance_to(&p).abs() < EPS);
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let d = GeoPoint::new(10.0, 20.0).distance_to(&GeoPoint::new(11.0, 20.0));
        assert!((d - 111_195.0).abs() < 10.0, "got {d}");
    }

    #[test]
    fn altitude_does_not_affect_geometry() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(0.0, 1.0).with_altitude(500.0);
        assert!((a.bearing_to(&b) - 90.0).abs() < EPS);
    }

    #[test]
    fn validity_checks_ranges_and_finiteness() {
        assert!(GeoPoint::new(90.0, -180.0).is_valid());
        assert!(!GeoPoint::new(90.5, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, 180.1).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, 0.0).with_altitude(f64::INFINITY).is_valid());
    }

    #[test]
    fn circular_difference_wraps() {
        assert!((circular_difference(359.0, 1.0) - 2.0).abs() < EPS);
        assert!((circular_difference(1.0, 359.0) - 2.0).abs() < EPS);
        assert!((circular_difference(90.0, 270.0) - 180.0).abs() < EPS);
        assert!((circular_difference(363.0, 2.0) - 1.0).abs() < EPS);
        assert!(circular_difference(f64::NAN, 2.0).is_nan());
    }
}
