//! [`Stack`] – wires every component to its mailbox and spawns it.
//!
//! One task per component plus one for the router.  Components share
//! nothing but the directory of queue senders; the secret is copied into
//! each component that signs or verifies.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use wayguard_kernel::{EnvelopeConfig, EnvelopeEnforcer, IntegrityGuard, PolicyEngine};
use wayguard_middleware::{DEFAULT_CAPACITY, Outbox, QueueDirectory, Router, RouterStats, Shutdown, StatsSnapshot};
use wayguard_types::{GeoPoint, GuardError, Message, Mission, MissionSecret, Operation, Parameters, SecurityPolicy, names};

use crate::actuators::{CargoBay, Servos};
use crate::component::{Component, DEFAULT_RECV_TIMEOUT, run_component};
use crate::control::ControlSystem;
use crate::gateway::Gateway;
use crate::navigation::Navigation;
use crate::planner::Planner;
use crate::safety::SafetyBlock;

/// Default commanded speed of the control system.
pub const DEFAULT_CRUISE_SPEED: f64 = 50.0;

/// Everything needed to launch a [`Stack`].
#[derive(Debug, Clone)]
pub struct StackConfig {
    pub secret: MissionSecret,
    pub cruise_speed: f64,
    pub envelope: EnvelopeConfig,
    pub recv_timeout: Duration,
    pub mailbox_capacity: usize,
    /// Empty means [`default_policies`].
    pub policies: Vec<SecurityPolicy>,
    /// Spawn the logging `servos` / `cargo_bay` components.  Disable to
    /// register those mailboxes yourself.
    pub actuators: bool,
}

impl StackConfig {
    pub fn new(secret: MissionSecret) -> Self {
        Self {
            secret,
            cruise_speed: DEFAULT_CRUISE_SPEED,
            envelope: EnvelopeConfig::default(),
            recv_timeout: DEFAULT_RECV_TIMEOUT,
            mailbox_capacity: DEFAULT_CAPACITY,
            policies: Vec::new(),
            actuators: true,
        }
    }

    fn validate(&self) -> Result<(), GuardError> {
        if self.secret.is_empty() {
            return Err(GuardError::Config("mission secret is empty".into()));
        }
        if self.mailbox_capacity == 0 {
            return Err(GuardError::Config("mailbox capacity must be at least 1".into()));
        }
        if self.recv_timeout.is_zero() {
            return Err(GuardError::Config("receive timeout must be non-zero".into()));
        }
        if !self.cruise_speed.is_finite() || self.cruise_speed < 0.0 {
            return Err(GuardError::Config(format!("invalid cruise speed {}", self.cruise_speed)));
        }
        let EnvelopeConfig {
            arrival_tolerance_m,
            direction_tolerance_deg,
        } = self.envelope;
        if !arrival_tolerance_m.is_finite() || arrival_tolerance_m <= 0.0 {
            return Err(GuardError::Config(format!("invalid arrival tolerance {arrival_tolerance_m}")));
        }
        if !direction_tolerance_deg.is_finite() || !(0.0..=180.0).contains(&direction_tolerance_deg) {
            return Err(GuardError::Config(format!(
                "invalid direction tolerance {direction_tolerance_deg}"
            )));
        }
        Ok(())
    }
}

/// The allow-list used when configuration provides none.
pub fn default_policies() -> Vec<SecurityPolicy> {
    use Operation::*;
    use names::*;

    let table: &[(&str, &str, &[Operation])] = &[
        (OPERATOR, PLANNER, &[SetMission]),
        (PLANNER, COMMUNICATION_GATEWAY, &[SetMission]),
        (COMMUNICATION_GATEWAY, CONTROL_SYSTEM, &[SetMission]),
        (COMMUNICATION_GATEWAY, SAFETY_BLOCK, &[SetMission, VerifyMissionResult]),
        (GNSS, NAVIGATION, &[PositionUpdate]),
        (NAVIGATION, CONTROL_SYSTEM, &[PositionUpdate]),
        (NAVIGATION, SAFETY_BLOCK, &[PositionUpdate]),
        (CONTROL_SYSTEM, SAFETY_BLOCK, &[SetSpeed, SetDirection, LockCargo, ReleaseCargo]),
        (SAFETY_BLOCK, SERVOS, &[SetSpeed, SetDirection]),
        (SAFETY_BLOCK, CARGO_BAY, &[LockCargo, ReleaseCargo]),
    ];
    table
        .iter()
        .flat_map(|(src, dst, ops)| ops.iter().map(move |op| SecurityPolicy::new(*src, *dst, *op)))
        .collect()
}

/// A running stack.
pub struct Stack {
    directory: QueueDirectory,
    router_inbox: mpsc::Sender<Message>,
    policy: Arc<PolicyEngine>,
    stats: Arc<RouterStats>,
    shutdown: Shutdown,
    tasks: Vec<JoinHandle<()>>,
}

impl Stack {
    /// Register every mailbox and spawn every task.  Must be called from
    /// within a Tokio runtime.
    pub fn launch(config: StackConfig) -> Result<Self, GuardError> {
        config.validate()?;

        let directory = QueueDirectory::new();
        let shutdown = Shutdown::new();
        let policies = if config.policies.is_empty() {
            default_policies()
        } else {
            config.policies.clone()
        };
        let policy = Arc::new(PolicyEngine::new(policies));
        let router = Router::new(directory.clone(), Arc::clone(&policy));
        let stats = router.stats();

        let router_mailbox = directory.register(names::SECURITY_MONITOR, config.mailbox_capacity);
        let router_inbox = directory
            .get(names::SECURITY_MONITOR)
            .ok_or_else(|| GuardError::Channel("router inbox missing after registration".into()))?;

        let mut launcher = Launcher {
            directory: &directory,
            shutdown: &shutdown,
            capacity: config.mailbox_capacity,
            recv_timeout: config.recv_timeout,
            tasks: vec![tokio::spawn(router.run(
                router_mailbox,
                shutdown.clone(),
                config.recv_timeout,
            ))],
        };
        let outbox = |name: &str| Outbox::new(name, router_inbox.clone());
        let guard = IntegrityGuard::new(config.secret.clone());

        launcher.spawn(Planner::new(guard.clone(), outbox(names::PLANNER)));
        launcher.spawn(Gateway::new(guard.clone(), outbox(names::COMMUNICATION_GATEWAY)));
        launcher.spawn(Navigation::new(outbox(names::NAVIGATION)));
        launcher.spawn(ControlSystem::new(
            guard.clone(),
            outbox(names::CONTROL_SYSTEM),
            config.cruise_speed,
            config.envelope.arrival_tolerance_m,
        ));
        launcher.spawn(SafetyBlock::new(
            EnvelopeEnforcer::new(guard, config.envelope),
            outbox(names::SAFETY_BLOCK),
        ));
        if config.actuators {
            launcher.spawn(Servos::new());
            launcher.spawn(CargoBay::new());
        }
        let tasks = launcher.tasks;

        info!(
            components = tasks.len(),
            policies = policy.len(),
            cruise_speed = config.cruise_speed,
            "stack launched"
        );
        Ok(Self {
            directory,
            router_inbox,
            policy,
            stats,
            shutdown,
            tasks,
        })
    }

    pub fn directory(&self) -> &QueueDirectory {
        &self.directory
    }

    /// An outbox that sends as `source` through the router.
    pub fn outbox(&self, source: &str) -> Outbox {
        Outbox::new(source, self.router_inbox.clone())
    }

    pub fn policy_engine(&self) -> Arc<PolicyEngine> {
        Arc::clone(&self.policy)
    }

    pub fn router_stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Submit `mission` as the operator.
    pub fn upload_mission(&self, mission: Mission) {
        self.outbox(names::OPERATOR).send(
            names::PLANNER,
            Operation::SetMission,
            Parameters::Mission(Box::new(mission)),
        );
    }

    /// Inject a position fix as the GNSS receiver.
    pub fn report_position(&self, fix: GeoPoint) {
        self.outbox(names::GNSS)
            .send(names::NAVIGATION, Operation::PositionUpdate, Parameters::Position(fix));
    }

    /// Request shutdown and wait for every task to finish.
    pub async fn shutdown(self) -> StatsSnapshot {
        self.shutdown.request();
        for task in self.tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "component task ended abnormally");
            }
        }
        let stats = self.stats.snapshot();
        info!(%stats, "stack stopped");
        stats
    }
}

struct Launcher<'a> {
    directory: &'a QueueDirectory,
    shutdown: &'a Shutdown,
    capacity: usize,
    recv_timeout: Duration,
    tasks: Vec<JoinHandle<()>>,
}

impl Launcher<'_> {
    fn spawn<C: Component>(&mut self, component: C) {
        let mailbox = self.directory.register(component.name(), self.capacity);
        self.tasks.push(tokio::spawn(run_component(
            component,
            mailbox,
            self.shutdown.clone(),
            self.recv_timeout,
        )));
    }
}
