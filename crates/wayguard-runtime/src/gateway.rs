//! [`Gateway`] – first verifier on the mission's path.
//!
//! Verified missions are fanned out to the control system and the safety
//! block.  A mission that fails verification goes nowhere; the safety block
//! is told via `verify_mission_result(false)` so it can fail closed.

use tracing::{error, info};
use wayguard_kernel::IntegrityGuard;
use wayguard_middleware::Outbox;
use wayguard_types::{Message, Operation, Parameters, names};

use crate::component::{Component, ignore};

pub struct Gateway {
    guard: IntegrityGuard,
    outbox: Outbox,
}

impl Gateway {
    pub fn new(guard: IntegrityGuard, outbox: Outbox) -> Self {
        Self { guard, outbox }
    }
}

impl Component for Gateway {
    fn name(&self) -> &str {
        names::COMMUNICATION_GATEWAY
    }

    fn handle(&mut self, message: Message) {
        match (message.operation, &message.parameters) {
            (Operation::SetMission, Parameters::Mission(mission)) => match self.guard.check(mission) {
                Ok(()) => {
                    info!(source = %message.source, "mission verified; forwarding");
                    for destination in [names::CONTROL_SYSTEM, names::SAFETY_BLOCK] {
                        self.outbox.send(
                            destination,
                            Operation::SetMission,
                            Parameters::Mission(mission.clone()),
                        );
                    }
                }
                Err(e) => {
                    error!(source = %message.source, error = %e, "mission rejected");
                    self.outbox.send(
                        names::SAFETY_BLOCK,
                        Operation::VerifyMissionResult,
                        Parameters::Verified(false),
                    );
                }
            },
            _ => ignore(self.name(), &message),
        }
    }
}
