//! Terminal components.  Physical actuation is external; these only record
//! and log the commanded state.

use tracing::info;
use wayguard_types::{Message, Operation, Parameters, names};

use crate::component::{Component, ignore};

#[derive(Debug, Default)]
pub struct Servos {
    speed: f64,
    direction: f64,
}

impl Servos {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn direction(&self) -> f64 {
        self.direction
    }
}

impl Component for Servos {
    fn name(&self) -> &str {
        names::SERVOS
    }

    fn handle(&mut self, message: Message) {
        match (message.operation, &message.parameters) {
            (Operation::SetSpeed, Parameters::Speed(v)) => {
                self.speed = *v;
                info!(speed = v, "servos: speed set");
            }
            (Operation::SetDirection, Parameters::Direction(d)) => {
                self.direction = *d;
                info!(direction = d, "servos: direction set");
            }
            _ => ignore(self.name(), &message),
        }
    }
}

#[derive(Debug, Default)]
pub struct CargoBay {
    locked: bool,
}

impl CargoBay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }
}

impl Component for CargoBay {
    fn name(&self) -> &str {
        names::CARGO_BAY
    }

    fn handle(&mut self, message: Message) {
        match message.operation {
            Operation::LockCargo => {
                self.locked = true;
                info!("cargo bay locked");
            }
            Operation::ReleaseCargo => {
                self.locked = false;
                info!("cargo bay released");
            }
            _ => ignore(self.name(), &message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn servos_track_last_command() {
        let mut servos = Servos::new();
        servos.handle(Message::new(names::SAFETY_BLOCK, names::SERVOS, Operation::SetSpeed, Parameters::Speed(12.5)));
        servos.handle(Message::new(
            names::SAFETY_BLOCK,
            names::SERVOS,
            Operation::SetDirection,
            Parameters::Direction(270.0),
        ));
        assert_eq!(servos.speed(), 12.5);
        assert_eq!(servos.direction(), 270.0);
    }

    #[test]
    fn cargo_bay_toggles() {
        let mut bay = CargoBay::new();
        bay.handle(Message::new(names::SAFETY_BLOCK, names::CARGO_BAY, Operation::LockCargo, Parameters::Empty));
        assert!(bay.is_locked());
        bay.handle(Message::new(names::SAFETY_BLOCK, names::CARGO_BAY, Operation::ReleaseCargo, Parameters::Empty));
        assert!(!bay.is_locked());
    }
}
