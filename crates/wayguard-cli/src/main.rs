//! `wayguard` – runs the full component stack against a simulated GNSS
//! receiver.
//!
//! 1. Loads `~/.wayguard/config.toml` (or the path given as the first
//!    argument), applying `WAYGUARD_*` overrides.
//! 2. Launches every component behind the policy-checking router.
//! 3. Uploads the configured WPL mission, or a built-in demo route.
//! 4. Feeds interpolated position fixes until the route is flown or
//!    **Ctrl-C** is pressed, then prints the router's delivery counters.

mod config;
mod sim;

use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{info, warn};

use wayguard_middleware::StatsSnapshot;
use wayguard_runtime::{Stack, init_tracing};
use wayguard_types::{Mission, SpeedLimit, wpl};

const DEMO_SECRET: &str = "wayguard-demo-secret";

fn main() -> ExitCode {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(config::config_path);

    let mut cfg = match config::load_or_default(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}: {}", "Config error".red(), e);
            return ExitCode::FAILURE;
        }
    };

    // ── Structured logging ────────────────────────────────────────────────
    let _telemetry = init_tracing("wayguard", cfg.log_format);

    print_banner();
    if path.exists() {
        println!("  Config loaded from {}", path.display().to_string().bold());
    } else {
        println!("  {} – using defaults", "No config file".dimmed());
    }
    if cfg.mission_secret.is_empty() {
        println!(
            "  {}  Set {} or `mission_secret` before flying a real vehicle.",
            "Using the demo mission secret.".yellow(),
            "WAYGUARD_SECRET".bold()
        );
        cfg.mission_secret = DEMO_SECRET.to_string();
    }
    println!();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("{}: {}", "Failed to start runtime".red(), e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(fly(&cfg)) {
        Ok(stats) => {
            print_summary(&stats);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            ExitCode::FAILURE
        }
    }
}

async fn fly(cfg: &config::Config) -> Result<StatsSnapshot, String> {
    let mission = load_mission(cfg)?;
    let stack = Stack::launch(cfg.stack_config()?).map_err(|e| e.to_string())?;

    // ── Ctrl-C handler ────────────────────────────────────────────────────
    let stop = stack.shutdown_handle();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – stopping the stack …".yellow().bold());
        stop.request();
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler");
    }
    let stop = stack.shutdown_handle();

    let fixes = sim::fixes_along(&mission, cfg.sim_step_m);
    let interval = Duration::from_millis(cfg.sim_interval_ms);
    info!(
        waypoints = mission.waypoints.len(),
        fixes = fixes.len(),
        "uploading mission"
    );
    stack.upload_mission(mission);
    tokio::time::sleep(interval).await;

    for fix in fixes {
        if stop.is_requested() {
            break;
        }
        stack.report_position(fix);
        tokio::time::sleep(interval).await;
    }
    // Let the final stop and release commands drain.
    tokio::time::sleep(interval).await;

    Ok(stack.shutdown().await)
}

fn load_mission(cfg: &config::Config) -> Result<Mission, String> {
    let Some(file) = &cfg.mission_file else {
        println!("  Flying the built-in demo route.");
        return Ok(sim::demo_mission(cfg.default_speed_limit));
    };
    let text = std::fs::read_to_string(file)
        .map_err(|e| format!("Failed to read mission {}: {}", file.display(), e))?;
    let mission = wpl::load_mission(&text, vec![SpeedLimit::new(cfg.default_speed_limit, 0)], true)
        .map_err(|e| format!("{}: {}", file.display(), e))?;
    println!(
        "  Mission {} ({} waypoint(s))",
        file.display().to_string().bold(),
        mission.waypoints.len()
    );
    Ok(mission)
}

// ─────────────────────────────────────────────────────────────────────────────
// Output
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#"  _      __             ___                 __"#.bold().cyan());
    println!("{}", r#" | | /| / /__ ___ __ __/ _ |__ _____ _____ / /"#.bold().cyan());
    println!("{}", r#" | |/ |/ / _ `/ // / / __ / // / _ `/ __/ _  / "#.bold().cyan());
    println!("{}", r#" |__/|__/\_,_/\_, / /_/ |_\_,_/\_,_/_/  \_,_/  "#.bold().cyan());
    println!("{}", r#"             /___/                               "#.bold().cyan());
    println!();
    println!("  {} {}",
        "WayGuard".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Policy-enforced waypoint navigation");
    println!();
}

fn print_summary(stats: &StatsSnapshot) {
    println!();
    println!("  {}", "Router summary".bold());
    println!("    delivered  {}", stats.delivered.to_string().green());
    let highlight = |n: u64| {
        if n == 0 { n.to_string().dimmed() } else { n.to_string().red().bold() }
    };
    println!("    denied     {}", highlight(stats.denied));
    println!("    no route   {}", highlight(stats.no_route));
    println!("    dropped    {}", highlight(stats.dropped));
    println!();
}
