//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use linkstate::api;
use linkstate::config::AppConfig;
use linkstate::ticker::{epoch_ms, log_transitions};
use linkstate_core::{
    LinkStateError, NetworkGraph, NodeId, RouteExport, RouteTable, Session, TopologyMetrics,
    default_topology, load_topology, reachable_pairs,
};
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum topology file size (64 MB).
///
/// This prevents memory exhaustion from malicious or accidental large files.
const MAX_TOPOLOGY_FILE_SIZE: u64 = 64 * 1024 * 1024;

/// Validate file path.
///
/// Canonicalizes the path (resolving symlinks and ".."), and checks that it
/// exists and is a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, LinkStateError> {
    let canonical = path.canonicalize().map_err(|e| {
        LinkStateError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(LinkStateError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Validate output path: the parent directory must exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, LinkStateError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        LinkStateError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(LinkStateError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| LinkStateError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

// =============================================================================
// TOPOLOGY LOADING
// =============================================================================

/// Build a graph from `topo`, or the default two-router topology.
///
/// Every failure here is a `TopologyLoad` error.
pub fn load_graph(topo: Option<&Path>) -> Result<NetworkGraph, LinkStateError> {
    let mut graph = NetworkGraph::new();

    let Some(path) = topo else {
        let (r1, r2) = default_topology(&mut graph)
            .map_err(|e| LinkStateError::TopologyLoad(e.to_string()))?;
        tracing::info!(%r1, %r2, "Using default topology");
        return Ok(graph);
    };

    let as_load_error = |e: LinkStateError| LinkStateError::TopologyLoad(e.to_string());
    let validated = validate_file_path(path).map_err(as_load_error)?;

    let metadata = std::fs::metadata(&validated)
        .map_err(|e| LinkStateError::TopologyLoad(format!("Cannot read file metadata: {}", e)))?;
    if metadata.len() > MAX_TOPOLOGY_FILE_SIZE {
        return Err(LinkStateError::TopologyLoad(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_TOPOLOGY_FILE_SIZE
        )));
    }

    let bytes = std::fs::read(&validated)
        .map_err(|e| LinkStateError::TopologyLoad(format!("Read file: {}", e)))?;
    let summary = load_topology(&bytes, &mut graph)?;

    tracing::info!(
        path = %validated.display(),
        nodes = summary.nodes_added,
        links = summary.links_added,
        skipped_links = summary.skipped_links,
        "Topology loaded"
    );
    if summary.skipped_links > 0 {
        tracing::warn!(
            skipped_links = summary.skipped_links,
            "Some links were skipped (unknown node id, self-loop, duplicate or invalid weight)"
        );
    }

    Ok(graph)
}

/// Graph from `topo` wrapped in a session configured from `config`.
pub fn load_session(config: &AppConfig, topo: Option<&Path>) -> Result<Session, LinkStateError> {
    let graph = load_graph(topo)?;
    let mut session = Session::with_graph(graph, config.hysteresis.params());
    session.set_hysteresis_enabled(config.hysteresis.enabled);
    Ok(session)
}

/// Write the route export of `session` to `output`.
///
/// Every failure here is an `Export` error.
pub fn write_export(session: &Session, output: &Path) -> Result<PathBuf, LinkStateError> {
    let validated = validate_output_path(output)
        .map_err(|e| LinkStateError::Export(e.to_string()))?;

    let text = RouteExport::build(session.graph(), session.router(), epoch_ms()).to_json_pretty()?;
    std::fs::write(&validated, text.as_bytes())
        .map_err(|e| LinkStateError::Export(format!("Write file: {}", e)))?;

    tracing::info!(path = %validated.display(), bytes = text.len(), "Routes exported");
    Ok(validated)
}

// =============================================================================
// RUN COMMAND
// =============================================================================

/// Headless run: load, tick, recompute, then export or print.
pub fn cmd_run(
    config: &AppConfig,
    topo: Option<&Path>,
    export: Option<&Path>,
    source: Option<u64>,
    ticks: u64,
    dt_ms: u64,
    json_mode: bool,
) -> Result<(), LinkStateError> {
    let mut session = load_session(config, topo)?;

    // Synthetic clock: tick i happens at i * dt_ms.
    for i in 1..=ticks {
        let now = i.saturating_mul(dt_ms);
        if let Some(report) = session.tick(now, dt_ms) {
            log_transitions(&report);
        }
    }
    if ticks > 0 {
        tracing::info!(ticks, dt_ms, "Hysteresis ticks complete");
    }

    if let Some(output) = export {
        let written = write_export(&session, output)?;
        println!("Exported routes to {}", written.display());
        return Ok(());
    }

    let source = source
        .map(NodeId)
        .or_else(|| session.graph().node_ids().next());
    let Some(source) = source else {
        println!("Topology is empty, no routes to show");
        return Ok(());
    };

    match session.table(source) {
        Some(table) => print_table(table, json_mode),
        None => Err(LinkStateError::NodeNotFound(source)),
    }
}

fn print_table(table: &RouteTable, json_mode: bool) -> Result<(), LinkStateError> {
    if json_mode {
        let text = serde_json::to_string_pretty(table)
            .map_err(|e| LinkStateError::IoError(format!("Serialize table: {}", e)))?;
        println!("{}", text);
        return Ok(());
    }

    println!("Routes from node {}:", table.source);
    for e in table.iter() {
        println!(
            "  dest={} next={} cost={} hops={}",
            e.destination, e.next_hop, e.total_cost, e.hop_count
        );
    }
    Ok(())
}

// =============================================================================
// SERVE COMMAND
// =============================================================================

/// Resolved server settings (config file values with CLI overrides applied).
#[derive(Debug, Clone)]
pub struct ServeOptions {
    pub host: String,
    pub port: u16,
    pub tick_ms: u64,
}

/// Start the HTTP control server.
pub async fn cmd_serve(
    config: &AppConfig,
    topo: Option<&Path>,
    options: ServeOptions,
) -> Result<(), LinkStateError> {
    if options.tick_ms == 0 {
        return Err(LinkStateError::Config(
            "tick interval must be at least 1 ms".to_string(),
        ));
    }
    let session = load_session(config, topo)?;

    println!("linkstate control server starting...");
    println!();
    println!("Configuration:");
    println!("  Host:       {}", options.host);
    println!("  Port:       {}", options.port);
    println!("  Tick:       {} ms", options.tick_ms);
    println!("  Hysteresis: {}", if config.hysteresis.enabled { "on" } else { "off" });
    println!();
    println!("Endpoints:");
    println!("  GET  /status, /topology, /routes/{{src}}, /routes/{{src}}/{{dst}}");
    println!("  PUT  /topology");
    println!("  POST /nodes, /links, /links/status, /links/weight, /recompute, /export");
    println!("  GET|PUT /hysteresis");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", options.host, options.port);
    api::run_server(&addr, session, options.tick_ms).await
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show topology metrics.
pub fn cmd_status(
    config: &AppConfig,
    topo: Option<&Path>,
    json_mode: bool,
) -> Result<(), LinkStateError> {
    let session = load_session(config, topo)?;
    let metrics = TopologyMetrics::from_graph(session.graph());
    let pairs = reachable_pairs(session.router());

    if json_mode {
        let output = serde_json::json!({
            "topology": topo.map(|p| p.display().to_string()),
            "metrics": metrics,
            "reachable_pairs": pairs,
        });
        let text = serde_json::to_string_pretty(&output)
            .map_err(|e| LinkStateError::IoError(format!("Serialize status: {}", e)))?;
        println!("{}", text);
        return Ok(());
    }

    println!("linkstate Topology Status");
    println!("=========================");
    println!(
        "Topology: {}",
        topo.map_or_else(|| "(default)".to_string(), |p| p.display().to_string())
    );
    println!();
    println!("Nodes:           {}", metrics.node_count);
    println!("Links:           {}", metrics.link_count);
    println!("  UP:            {}", metrics.up_links);
    println!("  DOWN:          {}", metrics.down_links);
    println!("  Jammed:        {}", metrics.jammed_links);
    println!("Mean UP weight:  {:.3}", metrics.mean_up_weight);
    println!("Reachable pairs: {}", pairs);

    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn topology_file(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(json.as_bytes()).expect("write");
        file
    }

    #[test]
    fn default_graph_without_path() {
        let graph = load_graph(None).expect("default");
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.link_count(), 1);
    }

    #[test]
    fn missing_topology_is_a_load_error() {
        let result = load_graph(Some(Path::new("/definitely/not/here.json")));
        assert!(matches!(result, Err(LinkStateError::TopologyLoad(_))));
    }

    #[test]
    fn malformed_topology_is_a_load_error() {
        let file = topology_file("{\"nodes\": [");
        let result = load_graph(Some(file.path()));
        assert!(matches!(result, Err(LinkStateError::TopologyLoad(_))));
    }

    #[test]
    fn export_writes_document() {
        let dir = tempfile::tempdir().expect("temp dir");
        let output = dir.path().join("routes.json");
        let session = load_session(&AppConfig::default(), None).expect("session");

        let written = write_export(&session, &output).expect("export");

        let text = std::fs::read_to_string(written).expect("read");
        let value: serde_json::Value = serde_json::from_str(&text).expect("json");
        assert_eq!(value["meta"]["version"], "1.0.0");
        assert_eq!(value["routes"]["1"][0]["next_hop"], 2);
    }

    #[test]
    fn export_into_missing_directory_is_an_export_error() {
        let session = load_session(&AppConfig::default(), None).expect("session");
        let result = write_export(&session, Path::new("/definitely/not/here/routes.json"));
        assert!(matches!(result, Err(LinkStateError::Export(_))));
    }

    #[test]
    fn run_with_ticks_and_export() {
        let file = topology_file(
            r#"{"nodes": [{"id": 1}, {"id": 2}, {"id": 3}],
                "links": [{"u": 1, "v": 2}, {"u": 2, "v": 3, "weight": 5.0}]}"#,
        );
        let dir = tempfile::tempdir().expect("temp dir");
        let output = dir.path().join("out.json");

        cmd_run(
            &AppConfig::default(),
            Some(file.path()),
            Some(&output),
            None,
            3,
            500,
            false,
        )
        .expect("run");

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).expect("read")).expect("json");
        // The weight-5 link crosses theta_up on the first tick and goes DOWN.
        assert_eq!(value["links"][1]["status"], "DOWN");
        assert_eq!(value["routes"]["1"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn run_unknown_source_fails() {
        let result = cmd_run(&AppConfig::default(), None, None, Some(99), 0, 0, false);
        assert!(matches!(result, Err(LinkStateError::NodeNotFound(_))));
    }

    #[test]
    fn status_succeeds_in_both_output_modes() {
        let file =
            topology_file(r#"{"nodes": [{"id": 1}, {"id": 2}], "links": [{"u": 1, "v": 2}]}"#);
        let config = AppConfig::default();

        assert!(cmd_status(&config, Some(file.path()), true).is_ok());
        assert!(cmd_status(&config, None, false).is_ok());
    }

    #[test]
    fn status_reports_load_errors() {
        let result = cmd_status(&AppConfig::default(), Some(Path::new("/no/such/topo.json")), true);
        assert!(matches!(result, Err(LinkStateError::TopologyLoad(_))));
    }
}
