//! Well-known mailbox names.

pub const OPERATOR: &str = "operator";
pub const PLANNER: &str = "planner";
pub const COMMUNICATION_GATEWAY: &str = "communication_gateway";
pub const GNSS: &str = "gnss";
pub const NAVIGATION: &str = "navigation";
pub const CONTROL_SYSTEM: &str = "control_system";
pub const SAFETY_BLOCK: &str = "safety_block";
pub const SERVOS: &str = "servos";
pub const CARGO_BAY: &str = "cargo_bay";
/// Inbox drained by the router.
pub const SECURITY_MONITOR: &str = "security_monitor";
