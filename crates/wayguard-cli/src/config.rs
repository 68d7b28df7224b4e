//! Configuration – reads `~/.wayguard/config.toml` (or an explicit path).
//!
//! ```toml
//! mission_secret = "change-me"
//! mission_file = "survey.waypoints"
//! cruise_speed = 80.0
//!
//! [[policies]]
//! source = "safety_block"
//! destination = "servos"
//! operation = "set_speed"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use zeroize::Zeroize;

use wayguard_kernel::EnvelopeConfig;
use wayguard_runtime::{LogFormat, StackConfig};
use wayguard_types::{MissionSecret, Operation, SecurityPolicy};

/// One `[[policies]]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyEntry {
    pub source: String,
    pub destination: String,
    pub operation: String,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Shared mission signing key.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mission_secret: String,

    /// QGC WPL waypoint file; the built-in demo route is used when absent.
    #[serde(default)]
    pub mission_file: Option<PathBuf>,

    /// Limit applied from the first waypoint of a WPL mission onward.
    #[serde(default = "default_speed_limit")]
    pub default_speed_limit: f64,

    #[serde(default = "default_cruise_speed")]
    pub cruise_speed: f64,

    #[serde(default = "default_arrival_tolerance")]
    pub arrival_tolerance_m: f64,

    #[serde(default = "default_direction_tolerance")]
    pub direction_tolerance_deg: f64,

    #[serde(default = "default_recv_timeout_ms")]
    pub recv_timeout_ms: u64,

    #[serde(default = "default_mailbox_capacity")]
    pub mailbox_capacity: usize,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Distance between simulated GNSS fixes, in metres.
    #[serde(default = "default_sim_step")]
    pub sim_step_m: f64,

    /// Delay between simulated GNSS fixes.
    #[serde(default = "default_sim_interval_ms")]
    pub sim_interval_ms: u64,

    /// Empty means the built-in allow-list.
    #[serde(default)]
    pub policies: Vec<PolicyEntry>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field(
                "mission_secret",
                if self.mission_secret.is_empty() { &"<not set>" } else { &"<redacted>" },
            )
            .field("mission_file", &self.mission_file)
            .field("default_speed_limit", &self.default_speed_limit)
            .field("cruise_speed", &self.cruise_speed)
            .field("arrival_tolerance_m", &self.arrival_tolerance_m)
            .field("direction_tolerance_deg", &self.direction_tolerance_deg)
            .field("recv_timeout_ms", &self.recv_timeout_ms)
            .field("mailbox_capacity", &self.mailbox_capacity)
            .field("log_format", &self.log_format)
            .field("sim_step_m", &self.sim_step_m)
            .field("sim_interval_ms", &self.sim_interval_ms)
            .field("policies", &self.policies.len())
            .finish()
    }
}

impl Drop for Config {
    fn drop(&mut self) {
        self.mission_secret.zeroize();
    }
}

fn default_speed_limit() -> f64 {
    20.0
}
fn default_cruise_speed() -> f64 {
    wayguard_runtime::stack::DEFAULT_CRUISE_SPEED
}
fn default_arrival_tolerance() -> f64 {
    EnvelopeConfig::default().arrival_tolerance_m
}
fn default_direction_tolerance() -> f64 {
    EnvelopeConfig::default().direction_tolerance_deg
}
fn default_recv_timeout_ms() -> u64 {
    100
}
fn default_mailbox_capacity() -> usize {
    wayguard_middleware::DEFAULT_CAPACITY
}
/// Smallest accepted `sim_step_m`.
pub const MIN_SIM_STEP_M: f64 = 0.1;

fn default_sim_step() -> f64 {
    10.0
}
fn default_sim_interval_ms() -> u64 {
    200
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mission_secret: String::new(),
            mission_file: None,
            default_speed_limit: default_speed_limit(),
            cruise_speed: default_cruise_speed(),
            arrival_tolerance_m: default_arrival_tolerance(),
            direction_tolerance_deg: default_direction_tolerance(),
            recv_timeout_ms: default_recv_timeout_ms(),
            mailbox_capacity: default_mailbox_capacity(),
            log_format: LogFormat::default(),
            sim_step_m: default_sim_step(),
            sim_interval_ms: default_sim_interval_ms(),
            policies: Vec::new(),
        }
    }
}

impl Config {
    /// Parse the `[[policies]]` tables.  An unknown operation name is an
    /// error, not a silently dropped entry.
    pub fn security_policies(&self) -> Result<Vec<SecurityPolicy>, String> {
        self.policies
            .iter()
            .map(|p| {
                let op: Operation = p.operation.parse().map_err(|e| format!("{e}"))?;
                Ok(SecurityPolicy::new(&p.source, &p.destination, op))
            })
            .collect()
    }

    /// Check the settings that only the CLI consumes.
    pub fn validate(&self) -> Result<(), String> {
        if !self.sim_step_m.is_finite() || self.sim_step_m < MIN_SIM_STEP_M {
            return Err(format!(
                "sim_step_m must be a finite distance of at least {MIN_SIM_STEP_M} m, got {}",
                self.sim_step_m
            ));
        }
        if !self.default_speed_limit.is_finite() || self.default_speed_limit < 0.0 {
            return Err(format!("invalid default_speed_limit {}", self.default_speed_limit));
        }
        Ok(())
    }

    pub fn stack_config(&self) -> Result<StackConfig, String> {
        self.validate()?;
        let mut stack = StackConfig::new(MissionSecret::from(self.mission_secret.as_str()));
        stack.cruise_speed = self.cruise_speed;
        stack.envelope = EnvelopeConfig {
            arrival_tolerance_m: self.arrival_tolerance_m,
            direction_tolerance_deg: self.direction_tolerance_deg,
        };
        stack.recv_timeout = Duration::from_millis(self.recv_timeout_ms);
        stack.mailbox_capacity = self.mailbox_capacity;
        stack.policies = self.security_policies()?;
        Ok(stack)
    }
}

/// Return the path to `~/.wayguard/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".wayguard").join("config.toml")
}

/// Load the config at `path`, falling back to defaults when the file does
/// not exist.  Environment overrides apply either way.
pub fn load_or_default(path: &Path) -> Result<Config, String> {
    let mut cfg = load_from(path)?.unwrap_or_default();
    apply_env_overrides(&mut cfg)?;
    Ok(cfg)
}

/// Parse the file at `path`.  Returns `None` if it does not exist.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let cfg: Config = toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    Ok(Some(cfg))
}

/// Apply `WAYGUARD_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `WAYGUARD_SECRET` | `mission_secret` |
/// | `WAYGUARD_MISSION` | `mission_file` |
/// | `WAYGUARD_CRUISE_SPEED` | `cruise_speed` |
/// | `WAYGUARD_LOG_FORMAT` | `log_format` |
pub fn apply_env_overrides(cfg: &mut Config) -> Result<(), String> {
    apply_overrides(cfg, |key| std::env::var(key).ok())
}

fn apply_overrides(
    cfg: &mut Config,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), String> {
    if let Some(v) = lookup("WAYGUARD_SECRET") {
        cfg.mission_secret.zeroize();
        cfg.mission_secret = v;
    }
    if let Some(v) = lookup("WAYGUARD_MISSION") {
        cfg.mission_file = Some(PathBuf::from(v));
    }
    if let Some(v) = lookup("WAYGUARD_CRUISE_SPEED") {
        cfg.cruise_speed = v
            .parse::<f64>()
            .map_err(|e| format!("WAYGUARD_CRUISE_SPEED '{v}': {e}"))?;
    }
    if let Some(v) = lookup("WAYGUARD_LOG_FORMAT") {
        cfg.log_format = v.parse()?;
    }
    Ok(())
}
