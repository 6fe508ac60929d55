//! adapter-sentinel: config checker for the adapter supervision loop
//!
//! # Usage
//!
//! ```bash
//! # Validate ./sentinel.toml (or $SENTINEL_CONFIG) and print the plan
//! adapter-sentinel check
//!
//! # Validate a specific file
//! adapter-sentinel check --config /etc/sentinel/sentinel.toml
//! ```
//!
//! # Environment Variables
//!
//! - `SENTINEL_CONFIG`: Path to the config file
//! - `RUST_LOG`: Logging level (default: info)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use adapter_sentinel::clock::{Clock, SystemClock};
use adapter_sentinel::curfew::format_minutes;
use adapter_sentinel::MonitorConfig;

#[derive(Parser, Debug)]
#[command(name = "adapter-sentinel")]
#[command(about = "Supervision loop for bot adapter connections")]
#[command(version)]
struct CliArgs {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(Subcommand, Debug)]
enum SubCommand {
    /// Load and validate a config, then print what the monitor would do
    Check {
        /// Config file (default: $SENTINEL_CONFIG, then ./sentinel.toml, then built-in defaults)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

/// Strict load: the explicit file, or the first file in the standard search
/// order, must parse and validate.
fn load_config(path: Option<&Path>) -> Result<(MonitorConfig, String)> {
    let path = match path {
        Some(path) => Some(path.to_path_buf()),
        None => MonitorConfig::candidate_paths().into_iter().next(),
    };
    match path {
        Some(path) => {
            let config = MonitorConfig::load_from_file(&path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            Ok((config, path.display().to_string()))
        }
        None => {
            info!("No sentinel.toml found, checking built-in defaults");
            Ok((MonitorConfig::default(), "built-in defaults".to_string()))
        }
    }
}

fn check(path: Option<&Path>) -> Result<()> {
    let (config, origin) = load_config(path)?;
    let curfew = config.curfew()?;

    println!("Config: {origin}");
    println!();

    let plan = &config.reload_adapters;
    match plan.check_interval() {
        Some(period) => {
            println!(
                "Health check: every {} ms, reload after {} idle ticks",
                period.as_millis(),
                plan.retries + 1
            );
            if plan.intervals.is_empty() {
                println!("  (no connections have an idle threshold)");
            }
            for (id, threshold) in &plan.intervals {
                println!("  {id:<32} idle threshold {threshold} ms");
            }
        }
        None => println!("Health check: disabled"),
    }
    println!();

    if curfew.is_empty() {
        println!("Curfew: none");
    } else {
        println!("Curfew:");
        for window in curfew.windows() {
            let note = if window.is_permanently_closed() {
                "  (never opens)"
            } else {
                ""
            };
            println!(
                "  {} - {}{note}",
                format_minutes(window.start),
                format_minutes(window.end)
            );
        }
    }
    let minute = SystemClock.minute_of_day();
    println!(
        "Curfew active now: {}",
        if curfew.is_active(minute) { "yes" } else { "no" }
    );
    println!();

    match config.notify_route() {
        Some(route) => println!("Notifications: via {} to {}", route.via, route.target),
        None => println!("Notifications: disabled"),
    }
    if config.reload_on_disconnect {
        println!(
            "Reload on disconnect: after {} ms",
            config.reload_on_disconnect_delay_ms
        );
    } else {
        println!("Reload on disconnect: disabled");
    }
    println!("Ping command: {}", if config.ping { "enabled" } else { "disabled" });

    Ok(())
}

fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.log_json);

    match args.command {
        SubCommand::Check { config } => check(config.as_deref()),
    }
}
