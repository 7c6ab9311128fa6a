//! # connwatch
//!
//! A live terminal dashboard for network connections reported by a
//! monitoring backend, with per-process block actions.
//!
//! ## Features
//!
//! - Periodic polling of a backend `/connections` endpoint
//! - Grouped, expandable connection list that keeps its expand/collapse
//!   state across refreshes
//! - Per-connection detail panels and block-intent dispatch
//! - Degrades to a stale view (never a blank one) while the backend is
//!   unreachable
//!
//! ## Example
//!
//! ```rust,no_run
//! use connwatch::cli::Args;
//! use connwatch::run;
//!
//! let args = Args {
//!     url: Some("http://localhost:4000".to_string()),
//!     refresh_interval: 5000,
//!     once: true,
//!     ..Default::default()
//! };
//!
//! run(args).expect("Failed to run connwatch");
//! ```

pub mod block;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod input;
pub mod logger;
pub mod poller;
pub mod presentation;
pub mod snapshot;
pub mod validation;
pub mod view;

use anyhow::Result;
use cli::Args;
use crossterm::{execute, terminal::*};
use poller::Poller;
use std::time::Duration;

/// Main entry point for the connwatch application.
///
/// Validates arguments, merges them over the config file, and runs
/// either the one-shot text mode or the full dashboard.
pub fn run(args: Args) -> Result<()> {
    // Validate all arguments before anything touches network or disk
    args.validate().map_err(|e| anyhow::anyhow!(e))?;

    let mut config = config::Config::load()?;
    config.apply_args(&args);

    if args.once {
        return run_once(&config);
    }

    match initialize_tui() {
        Ok(mut stdout) => {
            let result = dashboard::run_dashboard(config, args.log_file);

            // Cleanup
            let _ = disable_raw_mode();
            let _ = execute!(stdout, LeaveAlternateScreen);
            result
        }
        Err(e) => {
            eprintln!("TUI initialization failed: {e}");
            eprintln!("Run with --once for a text snapshot instead.");
            Err(e)
        }
    }
}

fn initialize_tui() -> Result<std::io::Stdout> {
    use std::io;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(e.into());
    }
    Ok(stdout)
}

/// Fetches a single snapshot and prints it as text (bypasses the TUI).
/// This is also what CI and scripts drive.
fn run_once(config: &config::Config) -> Result<()> {
    let mut poller = Poller::new(
        &config.base_url,
        Duration::from_millis(config.refresh_interval),
    );

    let snapshot = poller.fetch()?.unwrap_or_default();

    println!("Snapshot from {}", poller.endpoint_url());
    println!(
        "{} groups, {} connections",
        snapshot.group_count(),
        snapshot.connection_count()
    );

    for group in &snapshot.groups {
        println!("\n{} ({})", group.name, group.connections.len());
        for record in &group.connections {
            println!(
                "  {:<28} {:<4} {:<16} {} {}",
                record.destination_label(),
                record.country_code(),
                record.process,
                record.destination_ip,
                record.direction_arrow()
            );
        }
    }

    Ok(())
}
