//! `wayguard-middleware` – Message Plumbing
//!
//! Moves [`Message`][wayguard_types::Message]s between components without
//! interpreting their payload.  Authorization is delegated to the kernel's
//! [`PolicyEngine`][wayguard_kernel::PolicyEngine].
//!
//! # Modules
//!
//! - [`mailbox`] – bounded per-component [`Mailbox`]es, the name-keyed
//!   [`QueueDirectory`] and the cooperative [`Shutdown`] flag.
//! - [`router`] – the [`Router`] task, its [`RouterStats`] audit counters and
//!   the fire-and-forget [`Outbox`] each component sends through.

pub mod mailbox;
pub mod router;

pub use mailbox::{DEFAULT_CAPACITY, Mailbox, QueueDirectory, Received, Shutdown};
pub use router::{Outbox, RouteOutcome, Router, RouterStats, StatsSnapshot};
