//! [`PolicyEngine`] – the allow-list consulted before every delivery.
//!
//! A message is authorized only when its exact `(source, destination,
//! operation)` triple is present; anything unrecognised is denied.  The set
//! is replaced wholesale at runtime and never edited in place, so a reader
//! always observes one complete generation of the policy set.

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::info;
use wayguard_types::{GuardError, Message, Operation, SecurityPolicy};

type PolicySet = Arc<HashSet<SecurityPolicy>>;

/// Thread-safe allow-list of [`SecurityPolicy`] triples.
///
/// # Example
///
/// ```
/// use wayguard_kernel::PolicyEngine;
/// use wayguard_types::{Operation, SecurityPolicy};
///
/// let engine = PolicyEngine::new([SecurityPolicy::new("gnss", "navigation", Operation::PositionUpdate)]);
///
/// assert!(engine.is_allowed("gnss", "navigation", Operation::PositionUpdate));
/// assert!(!engine.is_allowed("gnss", "navigation", Operation::SetSpeed));
/// ```
#[derive(Debug, Default)]
pub struct PolicyEngine {
    policies: RwLock<PolicySet>,
}

impl PolicyEngine {
    /// Build an engine from `policies`.  Duplicate triples collapse.
    pub fn new(policies: impl IntoIterator<Item = SecurityPolicy>) -> Self {
        Self {
            policies: RwLock::new(Arc::new(policies.into_iter().collect())),
        }
    }

    // Writers only swap in a fully built set, so a poisoned lock still holds
    // a complete generation.
    fn current(&self) -> PolicySet {
        Arc::clone(&self.policies.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn is_allowed(&self, source: &str, destination: &str, operation: Operation) -> bool {
        self.current()
            .contains(&SecurityPolicy::new(source, destination, operation))
    }

    /// Return `Ok(())` when `message` is authorized, or
    /// [`GuardError::PolicyDenied`] naming the offending triple.
    pub fn check(&self, message: &Message) -> Result<(), GuardError> {
        if self.is_allowed(&message.source, &message.destination, message.operation) {
            Ok(())
        } else {
            Err(GuardError::PolicyDenied {
                sender: message.source.clone(),
                recipient: message.destination.clone(),
                operation: message.operation,
            })
        }
    }

    /// Atomically swap in a new policy set.
    ///
    /// The replacement is built before the write lock is taken; concurrent
    /// checks see either the previous set or this one.
    pub fn replace_policies(&self, policies: impl IntoIterator<Item = SecurityPolicy>) {
        let next: PolicySet = Arc::new(policies.into_iter().collect());
        let count = next.len();
        let mut slot = self.policies.write().unwrap_or_else(PoisonError::into_inner);
        let previous = std::mem::replace(&mut *slot, next);
        drop(slot);
        info!(previous = previous.len(), current = count, "policy set replaced");
    }

    pub fn len(&self) -> usize {
        self.current().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current().is_empty()
    }

    /// Sorted copy of the current generation.
    pub fn snapshot(&self) -> Vec<SecurityPolicy> {
        let mut out: Vec<SecurityPolicy> = self.current().iter().cloned().collect();
        out.sort();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use wayguard_types::Parameters;

    fn triple(src: &str, dst: &str, op: Operation) -> SecurityPolicy {
        SecurityPolicy::new(src, dst, op)
    }

    #[test]
    fn listed_triple_is_allowed() {
        let engine = PolicyEngine::new([triple("planner", "communication_gateway", Operation::SetMission)]);
        assert!(engine.is_allowed("planner", "communication_gateway", Operation::SetMission));
    }

    #[test]
    fn unknown_triples_are_denied() {
        let engine = PolicyEngine::new([triple("planner", "communication_gateway", Operation::SetMission)]);
        assert!(!engine.is_allowed("planner", "communication_gateway", Operation::SetSpeed));
        assert!(!engine.is_allowed("communication_gateway", "planner", Operation::SetMission));
        assert!(!engine.is_allowed("operator", "communication_gateway", Operation::SetMission));
    }

    #[test]
    fn empty_engine_denies_everything() {
        let engine = PolicyEngine::default();
        assert!(engine.is_empty());
        for op in Operation::ALL {
            assert!(!engine.is_allowed("a", "b", op));
        }
    }

    #[test]
    fn duplicates_collapse_by_value() {
        let engine = PolicyEngine::new([
            triple("gnss", "navigation", Operation::PositionUpdate),
            triple("gnss", "navigation", Operation::PositionUpdate),
        ]);
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn check_reports_denied_triple() {
        let engine = PolicyEngine::default();
        let msg = Message::new("gnss", "cargo_bay", Operation::ReleaseCargo, Parameters::Empty);
        let err = engine.check(&msg).unwrap_err();
        assert_eq!(
            err,
            GuardError::PolicyDenied {
                sender: "gnss".into(),
                recipient: "cargo_bay".into(),
                operation: Operation::ReleaseCargo,
            }
        );
    }

    #[test]
    fn replacement_is_wholesale() {
        let engine = PolicyEngine::new([triple("a", "b", Operation::SetSpeed)]);
        engine.replace_policies([triple("c", "d", Operation::SetDirection)]);
        assert!(!engine.is_allowed("a", "b", Operation::SetSpeed));
        assert!(engine.is_allowed("c", "d", Operation::SetDirection));
        assert_eq!(engine.snapshot(), vec![triple("c", "d", Operation::SetDirection)]);
    }

    #[test]
    fn concurrent_readers_never_observe_a_mixed_set() {
        let set_a = vec![
            triple("x", "y", Operation::SetSpeed),
            triple("x", "y", Operation::SetDirection),
            triple("x", "z", Operation::LockCargo),
        ];
        let set_b = vec![
            triple("p", "q", Operation::ReleaseCargo),
            triple("p", "q", Operation::SetMission),
        ];
        let mut sorted_a = set_a.clone();
        sorted_a.sort();
        let mut sorted_b = set_b.clone();
        sorted_b.sort();

        let engine = PolicyEngine::new(set_a.clone());
        let stop = AtomicBool::new(false);

        std::thread::scope(|s| {
            s.spawn(|| {
                for i in 0..500 {
                    let next = if i % 2 == 0 { set_b.clone() } else { set_a.clone() };
                    engine.replace_policies(next);
                }
                stop.store(true, Ordering::SeqCst);
            });
            for _ in 0..4 {
                s.spawn(|| {
                    while !stop.load(Ordering::SeqCst) {
                        let seen = engine.snapshot();
                        assert!(seen == sorted_a || seen == sorted_b, "mixed set: {seen:?}");
                    }
                });
            }
        });
    }
}
