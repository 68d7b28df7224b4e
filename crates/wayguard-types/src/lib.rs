//! `wayguard-types` – the shared vocabulary of the stack.
//!
//! Every component speaks in [`Message`]s addressed by component name and
//! tagged with an [`Operation`].  Authorization is expressed as
//! [`SecurityPolicy`] triples, route plans as [`Mission`]s, and every failure
//! the core can observe is a [`GuardError`].
//!
//! # Modules
//!
//! - [`geo`] – [`GeoPoint`] plus great-circle bearing and distance.
//! - [`mission`] – [`Mission`] / [`SpeedLimit`] and structural validation.
//! - [`names`] – well-known component (mailbox) names.
//! - [`secret`] – [`MissionSecret`], the zeroizing signing key holder.
//! - [`wpl`] – loader for QGroundControl `QGC WPL 110` waypoint files.

pub mod geo;
pub mod mission;
pub mod names;
pub mod secret;
pub mod wpl;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use geo::GeoPoint;
pub use mission::{Mission, SpeedLimit};
pub use secret::MissionSecret;

/// The operation vocabulary every component must recognise.
///
/// Serialized in `snake_case`, which is also the wire name used in policy
/// configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Deliver a (signed) route plan.
    SetMission,
    /// A fresh position fix.
    PositionUpdate,
    /// Commanded ground speed.
    SetSpeed,
    /// Commanded heading in degrees.
    SetDirection,
    /// Close the cargo bay.
    LockCargo,
    /// Open the cargo bay.
    ReleaseCargo,
    /// Outcome of an upstream mission verification.
    VerifyMissionResult,
}

impl Operation {
    /// Every operation, in declaration order.
    pub const ALL: [Operation; 7] = [
        Operation::SetMission,
        Operation::PositionUpdate,
        Operation::SetSpeed,
        Operation::SetDirection,
        Operation::LockCargo,
        Operation::ReleaseCargo,
        Operation::VerifyMissionResult,
    ];

    /// Wire name of the operation, e.g. `"set_speed"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::SetMission => "set_mission",
            Operation::PositionUpdate => "position_update",
            Operation::SetSpeed => "set_speed",
            Operation::SetDirection => "set_direction",
            Operation::LockCargo => "lock_cargo",
            Operation::ReleaseCargo => "release_cargo",
            Operation::VerifyMissionResult => "verify_mission_result",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = GuardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| GuardError::Config(format!("unknown operation '{s}'")))
    }
}

/// Typed payload carried by a [`Message`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Parameters {
    Empty,
    Mission(Box<Mission>),
    Position(GeoPoint),
    Speed(f64),
    Direction(f64),
    Verified(bool),
}

/// A single inter-component message.
///
/// `id` and `timestamp` exist for audit trails only; routing looks at
/// `source`, `destination` and `operation`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub destination: String,
    pub operation: Operation,
    pub parameters: Parameters,
}

impl Message {
    /// Build a fresh message stamped with a new id and the current time.
    pub fn new(
        source: impl Into<String>,
        destination: impl Into<String>,
        operation: Operation,
        parameters: Parameters,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source: source.into(),
            destination: destination.into(),
            operation,
            parameters,
        }
    }

    /// The authorization triple this message would need.
    pub fn policy(&self) -> SecurityPolicy {
        SecurityPolicy::new(&self.source, &self.destination, self.operation)
    }
}

/// An allow-list entry: `source` may send `operation` to `destination`.
///
/// Policies are values; a policy set is replaced wholesale, never edited.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SecurityPolicy {
    source: String,
    destination: String,
    operation: Operation,
}

impl SecurityPolicy {
    pub fn new(source: impl Into<String>, destination: impl Into<String>, operation: Operation) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            operation,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }
}

impl fmt::Display for SecurityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} ({})", self.source, self.destination, self.operation)
    }
}

/// Error taxonomy of the trust-and-safety core.
///
/// None of these are fatal: each resolves to a safe output (zero command,
/// dropped message, corrected value) plus a log record.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GuardError {
    #[error("Mission validation failed: {0}")]
    Validation(String),

    #[error("Mission integrity failure: {0}")]
    IntegrityFailure(String),

    #[error("Policy denied: {sender} -> {recipient} ({operation})")]
    PolicyDenied {
        sender: String,
        recipient: String,
        operation: Operation,
    },

    #[error("Envelope override on {command}: {details}")]
    EnvelopeOverride { command: Operation, details: String },

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
