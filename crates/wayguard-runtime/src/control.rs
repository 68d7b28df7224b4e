//! [`ControlSystem`] – the naive autopilot.
//!
//! It steers toward the next waypoint at a fixed cruise speed and never
//! consults the speed limits; the safety block downstream corrects it.

use tracing::{error, info};
use wayguard_kernel::{IntegrityGuard, Route};
use wayguard_middleware::Outbox;
use wayguard_types::{GeoPoint, Message, Operation, Parameters, names};

use crate::component::{Component, ignore};

pub struct ControlSystem {
    guard: IntegrityGuard,
    outbox: Outbox,
    cruise_speed: f64,
    arrival_tolerance_m: f64,
    route: Option<Route>,
}

impl ControlSystem {
    pub fn new(guard: IntegrityGuard, outbox: Outbox, cruise_speed: f64, arrival_tolerance_m: f64) -> Self {
        Self {
            guard,
            outbox,
            cruise_speed,
            arrival_tolerance_m,
            route: None,
        }
    }

    fn on_position(&mut self, fix: GeoPoint) {
        let Some(route) = self.route.as_mut() else {
            return;
        };
        if route.is_finished() {
            return;
        }
        if route.advance(&fix, self.arrival_tolerance_m) {
            info!("final waypoint reached; stopping and releasing cargo");
            self.outbox
                .send(names::SAFETY_BLOCK, Operation::SetSpeed, Parameters::Speed(0.0));
            self.outbox
                .send(names::SAFETY_BLOCK, Operation::ReleaseCargo, Parameters::Empty);
            return;
        }
        if let Some(bearing) = route.required_bearing(&fix) {
            self.outbox
                .send(names::SAFETY_BLOCK, Operation::SetDirection, Parameters::Direction(bearing));
            self.outbox.send(
                names::SAFETY_BLOCK,
                Operation::SetSpeed,
                Parameters::Speed(self.cruise_speed),
            );
        }
    }
}

impl Component for ControlSystem {
    fn name(&self) -> &str {
        names::CONTROL_SYSTEM
    }

    fn handle(&mut self, message: Message) {
        match (message.operation, &message.parameters) {
            (Operation::SetMission, Parameters::Mission(mission)) => match self.guard.check(mission) {
                Ok(()) => {
                    info!(waypoints = mission.waypoints.len(), "mission adopted; locking cargo");
                    self.route = Some(Route::new(mission.as_ref().clone()));
                    self.outbox
                        .send(names::SAFETY_BLOCK, Operation::LockCargo, Parameters::Empty);
                }
                Err(e) => {
                    error!(error = %e, "mission rejected; dropping active route");
                    self.route = None;
                }
            },
            (Operation::PositionUpdate, Parameters::Position(fix)) => self.on_position(*fix),
            _ => ignore(self.name(), &message),
        }
    }
}
