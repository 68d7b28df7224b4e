//! `wayguard-runtime` – Component Shells
//!
//! Turns the kernel's state machines into independently scheduled Tokio
//! tasks that talk only through the router.
//!
//! # Modules
//!
//! - [`component`] – the [`Component`] trait and the timeout-bounded,
//!   cancellable receive loop [`run_component`].
//! - [`planner`], [`gateway`], [`navigation`], [`control`], [`safety`],
//!   [`actuators`] – one component each.  The [`SafetyBlock`] wraps the
//!   kernel's [`EnvelopeEnforcer`][wayguard_kernel::EnvelopeEnforcer] and is
//!   the last hop before the actuators.
//! - [`stack`] – [`Stack::launch`] registers every mailbox, installs the
//!   policy set and spawns all tasks.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: console or
//!   JSON logs plus optional OTLP span export.

pub mod actuators;
pub mod component;
pub mod control;
pub mod gateway;
pub mod navigation;
pub mod planner;
pub mod safety;
pub mod stack;
pub mod telemetry;

pub use actuators::{CargoBay, Servos};
pub use component::{Component, run_component};
pub use control::ControlSystem;
pub use gateway::Gateway;
pub use navigation::Navigation;
pub use planner::Planner;
pub use safety::SafetyBlock;
pub use stack::{Stack, StackConfig, default_policies};
pub use telemetry::{LogFormat, TelemetryGuard, init_tracing};

#[cfg(test)]
pub(crate) mod testing {
    use tokio::sync::mpsc;
    use wayguard_kernel::IntegrityGuard;
    use wayguard_middleware::Outbox;
    use wayguard_types::{GeoPoint, Message, Mission, MissionSecret, SpeedLimit};

    pub fn secret() -> MissionSecret {
        MissionSecret::from("K")
    }

    /// An outbox whose router end the test holds.
    pub fn outbox(source: &str) -> (Outbox, mpsc::Receiver<Message>) {
        let (tx, rx) = mpsc::channel(32);
        (Outbox::new(source, tx), rx)
    }

    pub fn drain(rx: &mut mpsc::Receiver<Message>) -> Vec<Message> {
        std::iter::from_fn(|| rx.try_recv().ok()).collect()
    }

    /// Due north from the equator, ~111 m legs, 20 on every segment.
    pub fn unsigned_mission() -> Mission {
        Mission::new(
            GeoPoint::new(0.0, 0.0),
            vec![
                GeoPoint::new(0.001, 0.0),
                GeoPoint::new(0.002, 0.0),
                GeoPoint::new(0.003, 0.0),
            ],
            vec![SpeedLimit::new(20.0, 0)],
            true,
        )
    }

    pub fn signed_mission() -> Mission {
        IntegrityGuard::new(secret())
            .sign(&unsigned_mission())
            .unwrap_or_else(|e| panic!("fixture mission must sign: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayguard_types::{Operation, SecurityPolicy, names};

    #[test]
    fn default_policies_cover_the_command_chain() {
        let policies = default_policies();
        let allowed = |s: &str, d: &str, op| policies.contains(&SecurityPolicy::new(s, d, op));
        assert!(allowed(names::CONTROL_SYSTEM, names::SAFETY_BLOCK, Operation::SetSpeed));
        assert!(allowed(names::SAFETY_BLOCK, names::SERVOS, Operation::SetDirection));
        assert!(allowed(names::COMMUNICATION_GATEWAY, names::SAFETY_BLOCK, Operation::VerifyMissionResult));
        assert!(!allowed(names::CONTROL_SYSTEM, names::SERVOS, Operation::SetSpeed));
        assert!(!allowed(names::GNSS, names::CARGO_BAY, Operation::ReleaseCargo));
        assert_eq!(policies.len(), 16);
    }
}
