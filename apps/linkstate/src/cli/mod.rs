//! # Linkstate CLI Module
//!
//! This module implements the CLI interface for linkstate.
//!
//! ## Available Commands
//!
//! - `run` - Headless: load a topology, optionally tick hysteresis, export or print routes
//! - `serve` - Interactive: HTTP control server with a background ticker
//! - `status` - Show topology metrics
//!
//! ## Exit Codes
//!
//! - `0` success
//! - `1` topology load failed
//! - `2` export failed
//! - `3` any other error

mod commands;

use clap::{Parser, Subcommand};
use linkstate::config::AppConfig;
use linkstate_core::LinkStateError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// linkstate - link-state routing simulator
///
/// Topology graph, Dijkstra routing tables and OLSR-style link hysteresis.
#[derive(Parser, Debug)]
#[command(name = "linkstate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute routes once and export them or print one table
    Run {
        /// Topology JSON file (default: two routers, one link)
        #[arg(short, long)]
        topo: Option<PathBuf>,

        /// Write the route export to this path
        #[arg(short, long)]
        export: Option<PathBuf>,

        /// Node whose table is printed when not exporting (default: lowest id)
        #[arg(short, long)]
        source: Option<u64>,

        /// Hysteresis ticks to run before the final recompute
        #[arg(long, default_value = "0")]
        ticks: u64,

        /// Synthetic clock step per tick, in milliseconds
        #[arg(long, default_value = "100")]
        dt_ms: u64,
    },

    /// Start the interactive HTTP control server
    Serve {
        /// Topology JSON file (default: two routers, one link)
        #[arg(short, long)]
        topo: Option<PathBuf>,

        /// Host to bind to (overrides config)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Ticker interval in milliseconds (overrides config)
        #[arg(long)]
        tick_ms: Option<u64>,
    },

    /// Show topology metrics
    Status {
        /// Topology JSON file (default: two routers, one link)
        #[arg(short, long)]
        topo: Option<PathBuf>,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), LinkStateError> {
    let config = AppConfig::load_or_default(cli.config.as_deref())?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Run {
            topo,
            export,
            source,
            ticks,
            dt_ms,
        }) => cmd_run(
            &config,
            topo.as_deref(),
            export.as_deref(),
            source,
            ticks,
            dt_ms,
            json_mode,
        ),
        Some(Commands::Serve {
            topo,
            host,
            port,
            tick_ms,
        }) => {
            let server = ServeOptions {
                host: host.unwrap_or_else(|| config.server.host.clone()),
                port: port.unwrap_or(config.server.port),
                tick_ms: tick_ms.unwrap_or(config.server.tick_ms),
            };
            cmd_serve(&config, topo.as_deref(), server).await
        }
        Some(Commands::Status { topo }) => cmd_status(&config, topo.as_deref(), json_mode),
        None => {
            // No subcommand - headless run on the default topology
            cmd_run(&config, None, None, None, 0, 0, json_mode)
        }
    }
}

/// Process exit code for an error.
pub fn exit_code(error: &LinkStateError) -> i32 {
    match error {
        LinkStateError::TopologyLoad(_) => 1,
        LinkStateError::Export(_) => 2,
        _ => 3,
    }
}
