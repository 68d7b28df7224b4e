//! [`Navigation`] – relays GNSS fixes to the consumers of position.

use tracing::warn;
use wayguard_middleware::Outbox;
use wayguard_types::{Message, Operation, Parameters, names};

use crate::component::{Component, ignore};

pub struct Navigation {
    outbox: Outbox,
}

impl Navigation {
    pub fn new(outbox: Outbox) -> Self {
        Self { outbox }
    }
}

impl Component for Navigation {
    fn name(&self) -> &str {
        names::NAVIGATION
    }

    fn handle(&mut self, message: Message) {
        match (message.operation, &message.parameters) {
            (Operation::PositionUpdate, Parameters::Position(fix)) => {
                if !fix.is_valid() {
                    warn!(?fix, "discarding invalid position fix");
                    return;
                }
                for destination in [names::CONTROL_SYSTEM, names::SAFETY_BLOCK] {
                    self.outbox
                        .send(destination, Operation::PositionUpdate, Parameters::Position(*fix));
                }
            }
            _ => ignore(self.name(), &message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{drain, outbox};
    use wayguard_types::GeoPoint;

    #[test]
    fn fix_is_relayed_to_control_and_safety() {
        let (out, mut rx) = outbox(names::NAVIGATION);
        let mut nav = Navigation::new(out);
        let fix = GeoPoint::new(1.0, 2.0);
        nav.handle(Message::new(
            names::GNSS,
            names::NAVIGATION,
            Operation::PositionUpdate,
            Parameters::Position(fix),
        ));

        let sent = drain(&mut rx);
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].destination, names::CONTROL_SYSTEM);
        assert_eq!(sent[1].destination, names::SAFETY_BLOCK);
        assert!(sent.iter().all(|m| m.parameters == Parameters::Position(fix)));
    }

    #[test]
    fn invalid_fix_is_dropped() {
        let (out, mut rx) = outbox(names::NAVIGATION);
        let mut nav = Navigation::new(out);
        nav.handle(Message::new(
            names::GNSS,
            names::NAVIGATION,
            Operation::PositionUpdate,
            Parameters::Position(GeoPoint::new(f64::NAN, 0.0)),
        ));
        assert!(drain(&mut rx).is_empty());
    }
}
