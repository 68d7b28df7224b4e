//! [`SafetyBlock`] – message shell around the kernel's
//! [`EnvelopeEnforcer`].
//!
//! Exactly one command reaches the actuators per speed or direction request,
//! carrying the enforced value.  A rejected mission, locally or upstream,
//! zeroes both.

use tracing::{debug, error};
use wayguard_kernel::{CargoDecision, EnvelopeEnforcer};
use wayguard_middleware::Outbox;
use wayguard_types::{Message, Operation, Parameters, names};

use crate::component::{Component, ignore};

pub struct SafetyBlock {
    enforcer: EnvelopeEnforcer,
    outbox: Outbox,
}

impl SafetyBlock {
    pub fn new(enforcer: EnvelopeEnforcer, outbox: Outbox) -> Self {
        Self { enforcer, outbox }
    }

    pub fn enforcer(&self) -> &EnvelopeEnforcer {
        &self.enforcer
    }

    fn emit_zero(&self) {
        self.outbox
            .send(names::SERVOS, Operation::SetSpeed, Parameters::Speed(0.0));
        self.outbox
            .send(names::SERVOS, Operation::SetDirection, Parameters::Direction(0.0));
    }
}

impl Component for SafetyBlock {
    fn name(&self) -> &str {
        names::SAFETY_BLOCK
    }

    fn handle(&mut self, message: Message) {
        match (message.operation, &message.parameters) {
            (Operation::SetMission, Parameters::Mission(mission)) => {
                if self.enforcer.accept_mission(mission.as_ref().clone()).is_err() {
                    self.emit_zero();
                }
            }
            (Operation::VerifyMissionResult, Parameters::Verified(true)) => {
                debug!(source = %message.source, "upstream verification passed");
            }
            (Operation::VerifyMissionResult, Parameters::Verified(false)) => {
                self.enforcer
                    .fail_closed(&format!("{} reported mission verification failure", message.source));
                self.emit_zero();
            }
            (Operation::PositionUpdate, Parameters::Position(fix)) => {
                self.enforcer.update_position(*fix);
            }
            (Operation::SetSpeed, Parameters::Speed(requested)) => {
                let enforced = self.enforcer.request_speed(*requested);
                self.outbox
                    .send(names::SERVOS, Operation::SetSpeed, Parameters::Speed(enforced.value));
            }
            (Operation::SetDirection, Parameters::Direction(requested)) => {
                let enforced = self.enforcer.request_direction(*requested);
                self.outbox.send(
                    names::SERVOS,
                    Operation::SetDirection,
                    Parameters::Direction(enforced.value),
                );
            }
            (Operation::LockCargo, _) => {
                if self.enforcer.lock_cargo() == CargoDecision::Forward {
                    self.outbox
                        .send(names::CARGO_BAY, Operation::LockCargo, Parameters::Empty);
                }
            }
            (Operation::ReleaseCargo, _) => match self.enforcer.release_cargo() {
                CargoDecision::Forward => {
                    self.outbox
                        .send(names::CARGO_BAY, Operation::ReleaseCargo, Parameters::Empty);
                }
                CargoDecision::Denied => {
                    error!(source = %message.source, "cargo release blocked");
                }
            },
            _ => ignore(self.name(), &message),
        }
    }
}
