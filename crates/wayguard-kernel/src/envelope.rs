//! [`EnvelopeEnforcer`] – the last hop before actuation.
//!
//! Every speed, direction and cargo request is re-derived against the route
//! the enforcer itself adopted, regardless of what the requester believed:
//!
//! - **direction**: more than `direction_tolerance_deg` away from the initial
//!   great-circle bearing to the next waypoint is overridden with that bearing;
//! - **speed**: anything above the active segment's limit is clamped to it;
//! - **cargo**: release is only forwarded once the route is finished.
//!
//! Without an adopted route (never accepted, rejected, or failed closed) and
//! after the route finishes, speed and direction resolve to `0`.
//!
//! Each request produces exactly one [`Enforced`] value for downstream
//! emission, plus an `error` log record whenever it differs from the request.

use tracing::{error, info, warn};
use wayguard_types::{GeoPoint, GuardError, Mission, Operation, geo::circular_difference};

use crate::integrity::IntegrityGuard;
use crate::route::{DEFAULT_ARRIVAL_TOLERANCE_M, Route, RouteState};

/// Default maximum heading error accepted verbatim.
pub const DEFAULT_DIRECTION_TOLERANCE_DEG: f64 = 5.0;

/// Tunables of the envelope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeConfig {
    pub arrival_tolerance_m: f64,
    pub direction_tolerance_deg: f64,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            arrival_tolerance_m: DEFAULT_ARRIVAL_TOLERANCE_M,
            direction_tolerance_deg: DEFAULT_DIRECTION_TOLERANCE_DEG,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeAction {
    /// Request passed through verbatim.
    Accepted,
    /// Request replaced with the envelope value.
    Overridden,
    /// No active route, or the route is finished; value is `0`.
    Halted,
}

/// Outcome of a speed or direction request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Enforced {
    pub requested: f64,
    pub value: f64,
    pub action: EnvelopeAction,
}

impl Enforced {
    fn accepted(requested: f64) -> Self {
        Self {
            requested,
            value: requested,
            action: EnvelopeAction::Accepted,
        }
    }

    fn halted(requested: f64) -> Self {
        Self {
            requested,
            value: 0.0,
            action: EnvelopeAction::Halted,
        }
    }

    fn overridden(requested: f64, value: f64) -> Self {
        Self {
            requested,
            value,
            action: EnvelopeAction::Overridden,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CargoDecision {
    Forward,
    Denied,
}

pub struct EnvelopeEnforcer {
    guard: IntegrityGuard,
    config: EnvelopeConfig,
    route: Option<Route>,
    position: Option<GeoPoint>,
    speed: f64,
    direction: f64,
}

impl EnvelopeEnforcer {
    pub fn new(guard: IntegrityGuard, config: EnvelopeConfig) -> Self {
        Self {
            guard,
            config,
            route: None,
            position: None,
            speed: 0.0,
            direction: 0.0,
        }
    }

    /// Verify `mission` and adopt it as the active route.
    ///
    /// On failure the enforcer fails closed (no route, speed and direction
    /// `0`) and the verification error is returned.
    pub fn accept_mission(&mut self, mission: Mission) -> Result<(), GuardError> {
        if let Err(e) = self.guard.check(&mission) {
            self.fail_closed(&e.to_string());
            return Err(e);
        }
        info!(
            waypoints = mission.waypoints.len(),
            speed_limits = mission.speed_limits.len(),
            "mission adopted"
        );
        self.route = Some(Route::new(mission));
        self.speed = 0.0;
        self.direction = 0.0;
        Ok(())
    }

    /// Drop the active route and zero the commanded state.
    pub fn fail_closed(&mut self, reason: &str) {
        error!(reason, "envelope failing closed: route cleared, speed and direction zeroed");
        self.route = None;
        self.speed = 0.0;
        self.direction = 0.0;
    }

    /// Track a new position fix.  Returns `true` when it finishes the route.
    pub fn update_position(&mut self, position: GeoPoint) -> bool {
        if !position.is_valid() {
            warn!(?position, "ignoring invalid position fix");
            return false;
        }
        self.position = Some(position);
        let tolerance = self.config.arrival_tolerance_m;
        let Some(route) = self.route.as_mut() else {
            return false;
        };
        let finished = route.advance(&position, tolerance);
        if finished {
            info!("route finished");
        }
        finished
    }

    pub fn request_direction(&mut self, requested: f64) -> Enforced {
        let outcome = match self.required_bearing() {
            None => Enforced::halted(requested),
            Some(correct) => {
                let diff = circular_difference(requested, correct);
                // NaN never compares greater, so non-finite input is caught
                // explicitly.
                if !requested.is_finite() || diff > self.config.direction_tolerance_deg {
                    Enforced::overridden(requested, correct)
                } else {
                    Enforced::accepted(requested)
                }
            }
        };
        self.log_outcome(Operation::SetDirection, &outcome);
        self.direction = outcome.value;
        outcome
    }

    pub fn request_speed(&mut self, requested: f64) -> Enforced {
        let outcome = match self.active_route() {
            None => Enforced::halted(requested),
            Some(route) => {
                let limit = route.speed_limit();
                if !requested.is_finite() {
                    Enforced::overridden(requested, 0.0)
                } else if requested > limit {
                    Enforced::overridden(requested, limit)
                } else {
                    Enforced::accepted(requested)
                }
            }
        };
        self.log_outcome(Operation::SetSpeed, &outcome);
        self.speed = outcome.value;
        outcome
    }

    pub fn lock_cargo(&self) -> CargoDecision {
        CargoDecision::Forward
    }

    pub fn release_cargo(&self) -> CargoDecision {
        if self.state() == Some(RouteState::Finished) {
            info!("cargo release authorized");
            CargoDecision::Forward
        } else {
            error!(
                state = ?self.state(),
                "policy violation: cargo release requested before route finished"
            );
            CargoDecision::Denied
        }
    }

    /// `None` when no route is adopted.
    pub fn state(&self) -> Option<RouteState> {
        self.route.as_ref().map(Route::state)
    }

    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    /// Last fix, or the mission's home before the first fix.
    pub fn position(&self) -> Option<GeoPoint> {
        self.position
            .or_else(|| self.route.as_ref().map(|r| r.mission().home))
    }

    /// Last emitted speed.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Last emitted direction.
    pub fn direction(&self) -> f64 {
        self.direction
    }

    pub fn required_bearing(&self) -> Option<f64> {
        let position = self.position()?;
        self.active_route()?.required_bearing(&position)
    }

    fn active_route(&self) -> Option<&Route> {
        self.route.as_ref().filter(|r| !r.is_finished())
    }

    fn log_outcome(&self, command: Operation, outcome: &Enforced) {
        match outcome.action {
            EnvelopeAction::Accepted => {}
            EnvelopeAction::Overridden => {
                let err = GuardError::EnvelopeOverride {
                    command,
                    details: format!("requested {} replaced with {}", outcome.requested, outcome.value),
                };
                error!(
                    command = %command,
                    requested = outcome.requested,
                    enforced = outcome.value,
                    "{err}"
                );
            }
            EnvelopeAction::Halted if outcome.requested != 0.0 => {
                warn!(
                    command = %command,
                    requested = outcome.requested,
                    state = ?self.state(),
                    "no active route segment; command held at 0"
                );
            }
            EnvelopeAction::Halted => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayguard_types::{MissionSecret, SpeedLimit};

    fn guard() -> IntegrityGuard {
        IntegrityGuard::new(MissionSecret::from("K"))
    }

    // Due north from the equator, waypoints ~111 m apart.  Bearing is exactly 0.
    fn signed_mission() -> Mission {
        let mission = Mission::new(
            GeoPoint::new(0.0, 0.0),
            vec![
                GeoPoint::new(0.001, 0.0),
                GeoPoint::new(0.002, 0.0),
                GeoPoint::new(0.003, 0.0),
            ],
            vec![SpeedLimit::new(30.0, 0), SpeedLimit::new(10.0, 2)],
            true,
        );
        guard().sign(&mission).unwrap()
    }

    fn enforcer() -> EnvelopeEnforcer {
        let mut e = EnvelopeEnforcer::new(guard(), EnvelopeConfig::default());
        e.accept_mission(signed_mission()).unwrap();
        e
    }

    fn finish(e: &mut EnvelopeEnforcer) {
        e.update_position(GeoPoint::new(0.001, 0.0));
        e.update_position(GeoPoint::new(0.002, 0.0));
        assert!(e.update_position(GeoPoint::new(0.003, 0.0)));
    }

    #[test]
    fn accepted_mission_starts_en_route_from_home() {
        let e = enforcer();
        assert_eq!(e.state(), Some(RouteState::EnRoute));
        assert_eq!(e.position(), Some(GeoPoint::new(0.0, 0.0)));
        assert_eq!(e.required_bearing(), Some(0.0));
    }

    #[test]
    fn direction_within_tolerance_is_verbatim() {
        let mut e = enforcer();
        let out = e.request_direction(3.0);
        assert_eq!(out.action, EnvelopeAction::Accepted);
        assert_eq!(out.value, 3.0);
        assert_eq!(e.direction(), 3.0);
    }

    #[test]
    fn direction_exactly_at_tolerance_is_accepted() {
        let mut e = enforcer();
        assert_eq!(e.request_direction(5.0).action, EnvelopeAction::Accepted);
        assert_eq!(e.request_direction(355.0).action, EnvelopeAction::Accepted);
    }

    #[test]
    fn direction_far_off_is_overridden_with_bearing() {
        let mut e = enforcer();
        let out = e.request_direction(40.0);
        assert_eq!(out.action, EnvelopeAction::Overridden);
        assert_eq!(out.value, 0.0);
        assert_eq!(out.requested, 40.0);
    }

    #[test]
    fn direction_near_wraparound_is_accepted() {
        let mut e = enforcer();
        let out = e.request_direction(358.0);
        assert_eq!(out.action, EnvelopeAction::Accepted);
        assert_eq!(out.value, 358.0);
    }

    #[test]
    fn non_finite_direction_is_overridden() {
        let mut e = enforcer();
        let out = e.request_direction(f64::NAN);
        assert_eq!(out.action, EnvelopeAction::Overridden);
        assert_eq!(out.value, 0.0);
    }

    #[test]
    fn speed_under_limit_is_verbatim_and_over_limit_is_clamped() {
        let mut e = enforcer();
        assert_eq!(e.request_speed(25.0).value, 25.0);
        let out = e.request_speed(45.0);
        assert_eq!(out.action, EnvelopeAction::Overridden);
        assert_eq!(out.value, 30.0);
        assert_eq!(e.speed(), 30.0);
    }

    #[test]
    fn speed_limit_follows_segments() {
        let mut e = enforcer();
        e.update_position(GeoPoint::new(0.001, 0.0));
        assert_eq!(e.request_speed(45.0).value, 30.0);
        e.update_position(GeoPoint::new(0.002, 0.0));
        assert_eq!(e.request_speed(45.0).value, 10.0);
    }

    #[test]
    fn non_finite_speed_is_zeroed() {
        let mut e = enforcer();
        let out = e.request_speed(f64::INFINITY);
        assert_eq!(out.action, EnvelopeAction::Overridden);
        assert_eq!(out.value, 0.0);
    }

    #[test]
    fn cargo_release_gated_on_finish() {
        let mut e = enforcer();
        assert_eq!(e.lock_cargo(), CargoDecision::Forward);
        assert_eq!(e.release_cargo(), CargoDecision::Denied);
        finish(&mut e);
        assert_eq!(e.release_cargo(), CargoDecision::Forward);
    }

    #[test]
    fn finished_route_halts_motion() {
        let mut e = enforcer();
        finish(&mut e);
        assert_eq!(e.state(), Some(RouteState::Finished));
        assert_eq!(e.request_speed(10.0).action, EnvelopeAction::Halted);
        assert_eq!(e.request_direction(90.0).value, 0.0);
    }

    #[test]
    fn new_mission_resets_finished_route() {
        let mut e = enforcer();
        finish(&mut e);
        e.accept_mission(signed_mission()).unwrap();
        assert_eq!(e.state(), Some(RouteState::EnRoute));
        assert_eq!(e.route().and_then(Route::next_index), Some(0));
    }

    #[test]
    fn tampered_mission_fails_closed() {
        let mut e = enforcer();
        e.request_speed(25.0);
        e.request_direction(2.0);

        let mut tampered = signed_mission();
        tampered.waypoints[1].longitude = 0.5;
        let err = e.accept_mission(tampered).unwrap_err();

        assert!(matches!(err, GuardError::IntegrityFailure(_)));
        assert_eq!(e.state(), None);
        assert_eq!(e.speed(), 0.0);
        assert_eq!(e.direction(), 0.0);
        assert_eq!(e.request_speed(25.0).action, EnvelopeAction::Halted);
        assert_eq!(e.release_cargo(), CargoDecision::Denied);
    }

    #[test]
    fn without_route_everything_resolves_to_zero() {
        let mut e = EnvelopeEnforcer::new(guard(), EnvelopeConfig::default());
        assert_eq!(e.request_speed(12.0).value, 0.0);
        assert_eq!(e.request_direction(45.0).value, 0.0);
        assert_eq!(e.release_cargo(), CargoDecision::Denied);
    }

    #[test]
    fn invalid_fix_is_ignored() {
        let mut e = enforcer();
        assert!(!e.update_position(GeoPoint::new(f64::NAN, 0.0)));
        assert_eq!(e.position(), Some(GeoPoint::new(0.0, 0.0)));
    }

    #[test]
    fn fail_closed_clears_route() {
        let mut e = enforcer();
        e.fail_closed("upstream verification failed");
        assert_eq!(e.state(), None);
        assert_eq!(e.request_direction(0.0).action, EnvelopeAction::Halted);
    }
}
