//! [`Planner`] – signs operator missions and hands them to the gateway.

use tracing::{error, info};
use wayguard_kernel::IntegrityGuard;
use wayguard_middleware::Outbox;
use wayguard_types::{Message, Operation, Parameters, names};

use crate::component::{Component, ignore};

pub struct Planner {
    guard: IntegrityGuard,
    outbox: Outbox,
}

impl Planner {
    pub fn new(guard: IntegrityGuard, outbox: Outbox) -> Self {
        Self { guard, outbox }
    }
}

impl Component for Planner {
    fn name(&self) -> &str {
        names::PLANNER
    }

    fn handle(&mut self, message: Message) {
        match (message.operation, &message.parameters) {
            (Operation::SetMission, Parameters::Mission(mission)) => match self.guard.sign(mission) {
                Ok(signed) => {
                    info!(
                        waypoints = signed.waypoints.len(),
                        armed = signed.armed,
                        "mission signed; forwarding to gateway"
                    );
                    self.outbox.send(
                        names::COMMUNICATION_GATEWAY,
                        Operation::SetMission,
                        Parameters::Mission(Box::new(signed)),
                    );
                }
                Err(e) => error!(error = %e, "refusing to sign mission"),
            },
            _ => ignore(self.name(), &message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{drain, outbox, secret, unsigned_mission};

    #[test]
    fn signs_and_forwards_to_gateway() {
        let (out, mut rx) = outbox(names::PLANNER);
        let mut planner = Planner::new(IntegrityGuard::new(secret()), out);

        planner.handle(Message::new(
            names::OPERATOR,
            names::PLANNER,
            Operation::SetMission,
            Parameters::Mission(Box::new(unsigned_mission())),
        ));

        let sent = drain(&mut rx);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].destination, names::COMMUNICATION_GATEWAY);
        let Parameters::Mission(m) = &sent[0].parameters else {
            panic!("expected a mission payload");
        };
        assert!(IntegrityGuard::new(secret()).verify(m));
    }

    #[test]
    fn malformed_mission_is_dropped() {
        let (out, mut rx) = outbox(names::PLANNER);
        let mut planner = Planner::new(IntegrityGuard::new(secret()), out);
        let mut mission = unsigned_mission();
        mission.waypoints.clear();

        planner.handle(Message::new(
            names::OPERATOR,
            names::PLANNER,
            Operation::SetMission,
            Parameters::Mission(Box::new(mission)),
        ));
        assert!(drain(&mut rx).is_empty());
    }
}
