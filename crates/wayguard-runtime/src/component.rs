//! The [`Component`] contract and the receive loop that drives it.
//!
//! A component is a synchronous state machine: it is handed one
//! [`Message`] at a time and reacts by updating its own state and sending
//! through its [`Outbox`][wayguard_middleware::Outbox].  Scheduling, timeouts
//! and cancellation live in [`run_component`], so handlers never block and
//! never see the mailbox.

use std::time::Duration;

use tracing::{debug, info, warn};
use wayguard_middleware::{Mailbox, Received, Shutdown};
use wayguard_types::Message;

/// Default bound on a single mailbox wait.  Also the worst-case latency of a
/// shutdown request.
pub const DEFAULT_RECV_TIMEOUT: Duration = Duration::from_millis(100);

pub trait Component: Send + 'static {
    /// Mailbox name the component is registered under.
    fn name(&self) -> &str;

    /// Process one message to completion.
    fn handle(&mut self, message: Message);
}

/// Drive `component` from `mailbox` until shutdown is requested or the
/// mailbox closes.
///
/// A timeout is an idle cycle; the shutdown flag is checked before every
/// wait.
pub async fn run_component<C: Component>(
    mut component: C,
    mut mailbox: Mailbox,
    shutdown: Shutdown,
    recv_timeout: Duration,
) {
    info!(component = component.name(), "component started");
    while !shutdown.is_requested() {
        match mailbox.recv_timeout(recv_timeout).await {
            Received::Message(message) => {
                debug!(
                    component = component.name(),
                    id = %message.id,
                    source = %message.source,
                    operation = %message.operation,
                    "handling message"
                );
                component.handle(message);
            }
            Received::Idle => continue,
            Received::Closed => {
                warn!(component = component.name(), "mailbox closed");
                break;
            }
        }
    }
    info!(component = component.name(), "component stopped");
}

/// Log a message the component has no handler for.
pub(crate) fn ignore(component: &str, message: &Message) {
    warn!(
        component,
        source = %message.source,
        operation = %message.operation,
        parameters = ?message.parameters,
        "ignoring unexpected message"
    );
}
