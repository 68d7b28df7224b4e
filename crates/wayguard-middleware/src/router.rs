//! Policy-checked message router.
//!
//! Components never address each other directly.  They hand every message to
//! their [`Outbox`], which enqueues it on the router's own inbox
//! (`security_monitor`).  The [`Router`] task drains that inbox and makes a
//! single delivery attempt per message:
//!
//! | Step | Failure | Outcome |
//! |---|---|---|
//! | resolve destination in the [`QueueDirectory`] | unknown name | [`RouteOutcome::NoRoute`] |
//! | [`PolicyEngine::is_allowed`] | triple not listed | [`RouteOutcome::Denied`] |
//! | `try_send` on the destination mailbox | full or closed | [`RouteOutcome::Dropped`] |
//!
//! Failures are silent to the sender.  They are logged on the
//! `wayguard::audit` target and counted in [`RouterStats`].

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};
use wayguard_kernel::PolicyEngine;
use wayguard_types::{Message, Operation, Parameters};

use crate::mailbox::{Mailbox, QueueDirectory, Received, Shutdown};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    Delivered,
    Denied,
    NoRoute,
    Dropped,
}

impl fmt::Display for RouteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RouteOutcome::Delivered => "delivered",
            RouteOutcome::Denied => "denied",
            RouteOutcome::NoRoute => "no_route",
            RouteOutcome::Dropped => "dropped",
        })
    }
}

/// Audit counters, one per [`RouteOutcome`].
#[derive(Debug, Default)]
pub struct RouterStats {
    delivered: AtomicU64,
    denied: AtomicU64,
    no_route: AtomicU64,
    dropped: AtomicU64,
}

/// Point-in-time copy of [`RouterStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub delivered: u64,
    pub denied: u64,
    pub no_route: u64,
    pub dropped: u64,
}

impl RouterStats {
    fn record(&self, outcome: RouteOutcome) {
        let counter = match outcome {
            RouteOutcome::Delivered => &self.delivered,
            RouteOutcome::Denied => &self.denied,
            RouteOutcome::NoRoute => &self.no_route,
            RouteOutcome::Dropped => &self.dropped,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            delivered: self.delivered.load(Ordering::Relaxed),
            denied: self.denied.load(Ordering::Relaxed),
            no_route: self.no_route.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "delivered={} denied={} no_route={} dropped={}",
            self.delivered, self.denied, self.no_route, self.dropped
        )
    }
}

/// Single delivery point for inter-component traffic.  Cheap to clone.
#[derive(Debug, Clone)]
pub struct Router {
    directory: QueueDirectory,
    policy: Arc<PolicyEngine>,
    stats: Arc<RouterStats>,
}

impl Router {
    pub fn new(directory: QueueDirectory, policy: Arc<PolicyEngine>) -> Self {
        Self {
            directory,
            policy,
            stats: Arc::new(RouterStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<RouterStats> {
        Arc::clone(&self.stats)
    }

    pub fn policy(&self) -> Arc<PolicyEngine> {
        Arc::clone(&self.policy)
    }

    /// Make one delivery attempt for `message`.
    ///
    /// Never blocks: a full destination mailbox drops the message.
    pub fn route(&self, message: Message) -> RouteOutcome {
        let outcome = self.deliver(message);
        self.stats.record(outcome);
        outcome
    }

    fn deliver(&self, message: Message) -> RouteOutcome {
        let Some(queue) = self.directory.get(&message.destination) else {
            warn!(
                target: "wayguard::audit",
                id = %message.id,
                source = %message.source,
                destination = %message.destination,
                operation = %message.operation,
                "no mailbox registered for destination; message dropped"
            );
            return RouteOutcome::NoRoute;
        };

        if let Err(e) = self.policy.check(&message) {
            warn!(
                target: "wayguard::audit",
                id = %message.id,
                timestamp = %message.timestamp,
                "{e}"
            );
            return RouteOutcome::Denied;
        }

        let (id, source, destination, operation) = (
            message.id,
            message.source.clone(),
            message.destination.clone(),
            message.operation,
        );
        match queue.try_send(message) {
            Ok(()) => {
                debug!(
                    target: "wayguard::audit",
                    %id, %source, %destination, %operation,
                    "delivered"
                );
                RouteOutcome::Delivered
            }
            Err(TrySendError::Full(_)) => {
                warn!(
                    target: "wayguard::audit",
                    %id, %source, %destination, %operation,
                    "destination mailbox full; message dropped"
                );
                RouteOutcome::Dropped
            }
            Err(TrySendError::Closed(_)) => {
                warn!(
                    target: "wayguard::audit",
                    %id, %source, %destination, %operation,
                    "destination mailbox closed; message dropped"
                );
                RouteOutcome::Dropped
            }
        }
    }

    /// Drain `inbox` until shutdown is requested or every sender is gone.
    pub async fn run(self, mut inbox: Mailbox, shutdown: Shutdown, recv_timeout: Duration) {
        info!(inbox = inbox.name(), policies = self.policy.len(), "router started");
        while !shutdown.is_requested() {
            match inbox.recv_timeout(recv_timeout).await {
                Received::Message(message) => {
                    self.route(message);
                }
                Received::Idle => continue,
                Received::Closed => break,
            }
        }
        info!(stats = %self.stats.snapshot(), "router stopped");
    }
}

/// Sending half handed to a component.
///
/// Stamps every message with the owner's name and enqueues it for the router.
/// Sending is fire-and-forget: failures are logged, never returned.
#[derive(Debug, Clone)]
pub struct Outbox {
    source: String,
    router: mpsc::Sender<Message>,
}

impl Outbox {
    pub fn new(source: impl Into<String>, router: mpsc::Sender<Message>) -> Self {
        Self {
            source: source.into(),
            router,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn send(&self, destination: &str, operation: Operation, parameters: Parameters) {
        let message = Message::new(self.source.as_str(), destination, operation, parameters);
        if let Err(e) = self.router.try_send(message) {
            let reason = match e {
                TrySendError::Full(_) => "router inbox full",
                TrySendError::Closed(_) => "router inbox closed",
            };
            warn!(
                target: "wayguard::audit",
                source = %self.source,
                destination,
                %operation,
                reason,
                "outbound message dropped"
            );
        }
    }
}
