//! `wayguard-kernel` – Trust & Safety
//!
//! The decision-making core of the stack.  Nothing here does I/O or owns a
//! task; every type is a plain state machine that the runtime drives from
//! message handlers.
//!
//! # Modules
//!
//! - [`integrity`] – [`IntegrityGuard`][integrity::IntegrityGuard]:
//!   canonicalizes a [`Mission`][wayguard_types::Mission] and binds it to the
//!   shared secret with HMAC-SHA256 so that tampering in transit is detected.
//! - [`policy`] – [`PolicyEngine`][policy::PolicyEngine]: the
//!   `(source, destination, operation)` allow-list consulted by the router
//!   before every delivery.  Replaced wholesale, never edited.
//! - [`route`] – [`Route`][route::Route]: waypoint progress, active speed
//!   limit and required bearing for an adopted mission.
//! - [`envelope`] – [`EnvelopeEnforcer`][envelope::EnvelopeEnforcer]:
//!   the last hop before actuation.  Clamps speed, overrides heading and
//!   gates cargo release against the route it adopted itself.

pub mod envelope;
pub mod integrity;
pub mod policy;
pub mod route;

pub use envelope::{CargoDecision, Enforced, EnvelopeAction, EnvelopeConfig, EnvelopeEnforcer};
pub use integrity::{IntegrityGuard, canonicalize};
pub use policy::PolicyEngine;
pub use route::{Route, RouteState};
