//! [`Route`] – progress of the vehicle along an adopted [`Mission`].

use wayguard_types::{GeoPoint, Mission};

/// Default radius within which a waypoint counts as reached.
pub const DEFAULT_ARRIVAL_TOLERANCE_M: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteState {
    EnRoute,
    /// Terminal until a new mission is adopted.
    Finished,
}

/// Route progress: which waypoint is next and whether the route is done.
#[derive(Debug, Clone)]
pub struct Route {
    mission: Mission,
    next: usize,
    state: RouteState,
}

impl Route {
    /// Start at the first waypoint.  A mission without waypoints is finished
    /// from the outset.
    pub fn new(mission: Mission) -> Self {
        let state = if mission.waypoints.is_empty() {
            RouteState::Finished
        } else {
            RouteState::EnRoute
        };
        Self {
            mission,
            next: 0,
            state,
        }
    }

    pub fn mission(&self) -> &Mission {
        &self.mission
    }

    pub fn state(&self) -> RouteState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == RouteState::Finished
    }

    /// Index of the waypoint being approached, `None` once finished.
    pub fn next_index(&self) -> Option<usize> {
        match self.state {
            RouteState::EnRoute => Some(self.next),
            RouteState::Finished => None,
        }
    }

    pub fn next_waypoint(&self) -> Option<&GeoPoint> {
        self.next_index().and_then(|i| self.mission.waypoints.get(i))
    }

    /// Advance past every consecutive waypoint within `tolerance_m` of
    /// `position`.
    ///
    /// Returns `true` only on the update that finishes the route.
    pub fn advance(&mut self, position: &GeoPoint, tolerance_m: f64) -> bool {
        if self.is_finished() {
            return false;
        }
        while let Some(target) = self.mission.waypoints.get(self.next) {
            if position.distance_to(target) > tolerance_m {
                return false;
            }
            self.next += 1;
        }
        self.state = RouteState::Finished;
        true
    }

    /// Initial great-circle bearing from `position` to the next waypoint.
    pub fn required_bearing(&self, position: &GeoPoint) -> Option<f64> {
        self.next_waypoint().map(|wp| position.bearing_to(wp))
    }

    /// Speed limit of the active segment.
    ///
    /// A limit bound to the next waypoint wins; otherwise the limit of the
    /// most recently passed waypoint carries over.  Several limits on one
    /// index resolve to the smallest.  No applicable limit, or a finished
    /// route, yields `0.0`.
    pub fn speed_limit(&self) -> f64 {
        let Some(next) = self.next_index() else {
            return 0.0;
        };
        let limits = &self.mission.speed_limits;
        let bound_index = if limits.iter().any(|l| l.waypoint_index == next) {
            Some(next)
        } else {
            limits
                .iter()
                .map(|l| l.waypoint_index)
                .filter(|&i| i < next)
                .max()
        };
        bound_index
            .map(|idx| {
                limits
                    .iter()
                    .filter(|l| l.waypoint_index == idx)
                    .map(|l| l.limit)
                    .fold(f64::INFINITY, f64::min)
            })
            .unwrap_or(0.0)
    }
}
