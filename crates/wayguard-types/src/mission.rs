//! Route plans.
//!
//! A [`Mission`] is built by the planner, signed once and read-only from then
//! on.  Structural validation lives here so that both the signer and every
//! verifier apply the same rules.

use serde::{Deserialize, Serialize};

use crate::{GeoPoint, GuardError};

/// Maximum speed on the segment that ends at `waypoint_index`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedLimit {
    pub limit: f64,
    pub waypoint_index: usize,
}

impl SpeedLimit {
    pub fn new(limit: f64, waypoint_index: usize) -> Self {
        Self {
            limit,
            waypoint_index,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub home: GeoPoint,
    /// Traversal order is insertion order.
    pub waypoints: Vec<GeoPoint>,
    pub speed_limits: Vec<SpeedLimit>,
    pub armed: bool,
    /// Hex-encoded authenticity tag; absent until signed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl Mission {
    /// An unsigned mission.
    pub fn new(
        home: GeoPoint,
        waypoints: Vec<GeoPoint>,
        speed_limits: Vec<SpeedLimit>,
        armed: bool,
    ) -> Self {
        Self {
            home,
            waypoints,
            speed_limits,
            armed,
            signature: None,
        }
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    /// Structural checks applied before signing and after every verification.
    ///
    /// Returns [`GuardError::Validation`] describing the first offending field.
    pub fn validate(&self) -> Result<(), GuardError> {
        if self.waypoints.is_empty() {
            return Err(GuardError::Validation("mission has no waypoints".into()));
        }
        if !self.home.is_valid() {
            return Err(GuardError::Validation(format!(
                "home position out of range: ({}, {})",
                self.home.latitude, self.home.longitude
            )));
        }
        if let Some((i, wp)) = self.waypoints.iter().enumerate().find(|(_, wp)| !wp.is_valid()) {
            return Err(GuardError::Validation(format!(
                "waypoint {i} out of range: ({}, {})",
                wp.latitude, wp.longitude
            )));
        }
        for (i, sl) in self.speed_limits.iter().enumerate() {
            if !sl.limit.is_finite() || sl.limit < 0.0 {
                return Err(GuardError::Validation(format!(
                    "speed limit {i} is not a non-negative number: {}",
                    sl.limit
                )));
            }
            if sl.waypoint_index >= self.waypoints.len() {
                return Err(GuardError::Validation(format!(
                    "speed limit {i} references waypoint {} but mission has {}",
                    sl.waypoint_index,
                    self.waypoints.len()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Mission {
        Mission::new(
            GeoPoint::new(0.0, 0.0),
            vec![GeoPoint::new(0.0, 0.001), GeoPoint::new(0.001, 0.001)],
            vec![SpeedLimit::new(30.0, 0), SpeedLimit::new(10.0, 1)],
            true,
        )
    }

    #[test]
    fn well_formed_mission_validates() {
        assert!(sample().validate().is_ok());
        assert!(!sample().is_signed());
    }

    #[test]
    fn empty_waypoints_rejected() {
        let mut m = sample();
        m.waypoints.clear();
        m.speed_limits.clear();
        assert!(matches!(m.validate(), Err(GuardError::Validation(_))));
    }

    #[test]
    fn out_of_range_speed_limit_index_rejected() {
        let mut m = sample();
        m.speed_limits.push(SpeedLimit::new(5.0, 2));
        let err = m.validate().unwrap_err();
        assert!(err.to_string().contains("references waypoint 2"));
    }

    #[test]
    fn negative_or_nan_limit_rejected() {
        let mut m = sample();
        m.speed_limits[0].limit = -1.0;
        assert!(m.validate().is_err());
        m.speed_limits[0].limit = f64::NAN;
        assert!(m.validate().is_err());
    }

    #[test]
    fn bad_coordinates_rejected() {
        let mut m = sample();
        m.waypoints[1].latitude = 91.0;
        assert!(m.validate().unwrap_err().to_string().contains("waypoint 1"));

        let mut m = sample();
        m.home.longitude = f64::INFINITY;
        assert!(m.validate().unwrap_err().to_string().contains("home"));
    }

    #[test]
    fn unsigned_mission_omits_signature_on_the_wire() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("signature").is_none());

        let parsed: Mission = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.signature, None);
    }
}
