//! Named, bounded mailboxes and the directory that resolves them.
//!
//! Every component owns exactly one [`Mailbox`].  Senders never hold a
//! mailbox handle directly; they resolve the destination by name through the
//! shared [`QueueDirectory`] at delivery time.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;
use wayguard_types::Message;

/// Default mailbox capacity (buffered messages before the router starts
/// dropping).
pub const DEFAULT_CAPACITY: usize = 64;

/// Cooperative cancellation flag shared by every receive loop.
///
/// Clones share the flag.  [`Shutdown::flag`] exposes the raw
/// `Arc<AtomicBool>` for signal handlers.
#[derive(Debug, Clone, Default)]
pub struct Shutdown(Arc<AtomicBool>);

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.0)
    }
}

/// One receive attempt on a [`Mailbox`].
#[derive(Debug)]
pub enum Received {
    Message(Message),
    /// Nothing arrived within the timeout.
    Idle,
    /// Every sender is gone.
    Closed,
}

/// Receiving half of a component's queue.
#[derive(Debug)]
pub struct Mailbox {
    name: String,
    receiver: mpsc::Receiver<Message>,
}

impl Mailbox {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wait at most `timeout` for the next message.
    pub async fn recv_timeout(&mut self, timeout: Duration) -> Received {
        match tokio::time::timeout(timeout, self.receiver.recv()).await {
            Ok(Some(message)) => Received::Message(message),
            Ok(None) => Received::Closed,
            Err(_) => Received::Idle,
        }
    }

    /// Non-blocking receive; `None` when empty or closed.
    pub fn try_recv(&mut self) -> Option<Message> {
        self.receiver.try_recv().ok()
    }
}

/// Shared name → queue directory.  Clone it cheaply; all clones see the same
/// entries.
#[derive(Debug, Clone, Default)]
pub struct QueueDirectory {
    queues: Arc<RwLock<HashMap<String, mpsc::Sender<Message>>>>,
}

impl QueueDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bounded mailbox for `name` and register its sender.
    ///
    /// Registering an existing name replaces the previous queue; messages
    /// already buffered there stay with the old receiver.
    pub fn register(&self, name: impl Into<String>, capacity: usize) -> Mailbox {
        let name = name.into();
        let (tx, rx) = mpsc::channel(capacity.max(1));
        self.insert(name.clone(), tx);
        Mailbox { name, receiver: rx }
    }

    /// Register an externally created sender under `name`.
    pub fn insert(&self, name: impl Into<String>, sender: mpsc::Sender<Message>) {
        let name = name.into();
        let replaced = self
            .queues
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.clone(), sender)
            .is_some();
        debug!(mailbox = %name, replaced, "mailbox registered");
    }

    pub fn get(&self, name: &str) -> Option<mpsc::Sender<Message>> {
        self.queues
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn remove(&self, name: &str) -> bool {
        self.queues
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .is_some()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .queues
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayguard_types::{Operation, Parameters};

    fn msg(dst: &str) -> Message {
        Message::new("test", dst, Operation::LockCargo, Parameters::Empty)
    }

    #[tokio::test]
    async fn registered_mailbox_receives_through_directory() {
        let dir = QueueDirectory::new();
        let mut mailbox = dir.register("cargo_bay", 4);
        assert_eq!(mailbox.name(), "cargo_bay");

        let sent = msg("cargo_bay");
        dir.get("cargo_bay").unwrap().try_send(sent.clone()).unwrap();

        match mailbox.recv_timeout(Duration::from_millis(100)).await {
            Received::Message(m) => assert_eq!(m.id, sent.id),
            other => panic!("expected a message, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_mailbox_times_out_as_idle() {
        let dir = QueueDirectory::new();
        let mut mailbox = dir.register("servos", 4);
        assert!(matches!(
            mailbox.recv_timeout(Duration::from_millis(10)).await,
            Received::Idle
        ));
    }

    #[tokio::test]
    async fn dropped_senders_close_the_mailbox() {
        let dir = QueueDirectory::new();
        let mut mailbox = dir.register("servos", 4);
        assert!(dir.remove("servos"));
        assert!(matches!(
            mailbox.recv_timeout(Duration::from_millis(100)).await,
            Received::Closed
        ));
    }

    #[test]
    fn unknown_name_resolves_to_none() {
        let dir = QueueDirectory::new();
        assert!(dir.get("nobody").is_none());
    }

    #[test]
    fn reregistering_replaces_queue() {
        let dir = QueueDirectory::new();
        let mut old = dir.register("planner", 4);
        let mut new = dir.register("planner", 4);
        dir.get("planner").unwrap().try_send(msg("planner")).unwrap();
        assert!(new.try_recv().is_some());
        assert!(old.try_recv().is_none());
        assert_eq!(dir.names(), vec!["planner".to_string()]);
    }

    #[test]
    fn shutdown_is_shared_between_clones() {
        let shutdown = Shutdown::new();
        let clone = shutdown.clone();
        assert!(!clone.is_requested());
        shutdown.request();
        assert!(clone.is_requested());
        assert!(shutdown.flag().load(Ordering::SeqCst));
    }
}
