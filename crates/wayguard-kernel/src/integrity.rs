//! [`IntegrityGuard`] – detects tampering with a [`Mission`] in transit.
//!
//! A mission is reduced to a canonical byte string (see [`canonicalize`]) and
//! bound to the shared [`MissionSecret`] with HMAC-SHA256.  The tag travels in
//! `Mission::signature` as lowercase hex.
//!
//! # Example
//!
//! ```
//! use wayguard_kernel::IntegrityGuard;
//! use wayguard_types::{GeoPoint, Mission, MissionSecret, SpeedLimit};
//!
//! let guard = IntegrityGuard::new(MissionSecret::from("k"));
//! let mission = Mission::new(
//!     GeoPoint::new(0.0, 0.0),
//!     vec![GeoPoint::new(0.0, 0.01)],
//!     vec![SpeedLimit::new(20.0, 0)],
//!     true,
//! );
//!
//! let signed = guard.sign(&mission).unwrap();
//! assert!(guard.verify(&signed));
//!
//! let mut tampered = signed.clone();
//! tampered.waypoints[0].latitude += 0.5;
//! assert!(!guard.verify(&tampered));
//! ```

use hmac::{Hmac, Mac};
use serde_json::{Value, json};
use sha2::Sha256;
use tracing::debug;
use wayguard_types::{GeoPoint, GuardError, Mission, MissionSecret, SpeedLimit};

type HmacSha256 = Hmac<Sha256>;

// ────────────────────────────────────────────────────────────────────────────
// Canonical form
// ────────────────────────────────────────────────────────────────────────────

/// Deterministic byte form of `mission`, excluding its signature.
///
/// Object keys are emitted in sorted order at every level and no whitespace is
/// produced, so two logically equal missions always yield identical bytes.
pub fn canonicalize(mission: &Mission) -> Vec<u8> {
    let value = json!({
        "home": point_value(&mission.home),
        "waypoints": mission.waypoints.iter().map(point_value).collect::<Vec<_>>(),
        "speed_limits": mission.speed_limits.iter().map(limit_value).collect::<Vec<_>>(),
        "armed": mission.armed,
    });
    canonical_json(&value)
}

/// Compact JSON with object keys sorted lexicographically.
pub fn canonical_json(value: &Value) -> Vec<u8> {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out.into_bytes()
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(item, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn point_value(p: &GeoPoint) -> Value {
    json!({
        "latitude": p.latitude,
        "longitude": p.longitude,
        "altitude": p.altitude,
    })
}

fn limit_value(l: &SpeedLimit) -> Value {
    json!({
        "limit": l.limit,
        "waypoint_index": l.waypoint_index,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// IntegrityGuard
// ────────────────────────────────────────────────────────────────────────────

/// Signs and verifies missions with one secret.
///
/// Neither [`sign`](Self::sign) nor [`verify`](Self::verify) mutates its
/// input.
#[derive(Clone)]
pub struct IntegrityGuard {
    secret: MissionSecret,
}

impl IntegrityGuard {
    pub fn new(secret: MissionSecret) -> Self {
        Self { secret }
    }

    fn mac(&self) -> Result<HmacSha256, GuardError> {
        HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| GuardError::IntegrityFailure(format!("unusable key: {e}")))
    }

    /// Hex-encoded HMAC-SHA256 of `bytes`.
    pub fn tag(&self, bytes: &[u8]) -> Result<String, GuardError> {
        let mut mac = self.mac()?;
        mac.update(bytes);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Return a signed copy of `mission`.
    ///
    /// # Errors
    ///
    /// [`GuardError::Validation`] when the mission is malformed; malformed
    /// data is never signed.
    pub fn sign(&self, mission: &Mission) -> Result<Mission, GuardError> {
        mission.validate()?;
        let signature = self.tag(&canonicalize(mission))?;
        debug!(
            waypoints = mission.waypoints.len(),
            speed_limits = mission.speed_limits.len(),
            "mission signed"
        );
        Ok(Mission {
            signature: Some(signature),
            ..mission.clone()
        })
    }

    /// Explain why `mission` does not verify, or `Ok(())` when it does.
    ///
    /// Every failure is reported as [`GuardError::IntegrityFailure`].
    pub fn check(&self, mission: &Mission) -> Result<(), GuardError> {
        let signature = mission
            .signature
            .as_deref()
            .ok_or_else(|| GuardError::IntegrityFailure("mission is not signed".into()))?;
        mission
            .validate()
            .map_err(|e| GuardError::IntegrityFailure(format!("malformed mission: {e}")))?;
        let expected = hex::decode(signature)
            .map_err(|e| GuardError::IntegrityFailure(format!("undecodable signature: {e}")))?;

        let mut mac = self.mac()?;
        mac.update(&canonicalize(mission));
        mac.verify_slice(&expected)
            .map_err(|_| GuardError::IntegrityFailure("signature mismatch".into()))
    }

    /// `true` only for a well-formed mission carrying a matching signature.
    pub fn verify(&self, mission: &Mission) -> bool {
        self.check(mission).is_ok()
    }
}
