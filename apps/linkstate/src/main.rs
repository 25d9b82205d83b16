//! # linkstate
//!
//! The main binary for the linkstate routing simulator.
//!
//! This application provides:
//! - Headless CLI: load a topology, compute routes, export JSON
//! - Interactive HTTP control server with a background hysteresis ticker
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │               apps/linkstate (THE BINARY)            │
//! │                                                      │
//! │  ┌─────────────┐    ┌─────────────┐    ┌──────────┐  │
//! │  │    CLI      │    │  HTTP API   │    │  Ticker  │  │
//! │  │   (clap)    │    │   (axum)    │    │ (tokio)  │  │
//! │  └──────┬──────┘    └──────┬──────┘    └────┬─────┘  │
//! │         └──────────────────┼────────────────┘        │
//! │                            ▼                         │
//! │                   ┌────────────────┐                 │
//! │                   │ linkstate-core │                 │
//! │                   │  (THE LOGIC)   │                 │
//! │                   └────────────────┘                 │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Headless: compute and export routes
//! linkstate run --topo topo.json --export routes.json
//!
//! # Interactive control server
//! linkstate serve --topo topo.json --port 8080
//!
//! # Topology metrics
//! linkstate status --topo topo.json
//! ```

mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // LINKSTATE_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("LINKSTATE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "linkstate=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(cli::exit_code(&e));
    }
}

/// Print the startup banner.
fn print_banner() {
    println!(
        r#"
  linkstate v{}
  topology · dijkstra · link hysteresis
"#,
        env!("CARGO_PKG_VERSION")
    );
}
