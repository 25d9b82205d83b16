//! # linkstate-core
//!
//! Deterministic link-state routing core.
//!
//! This crate holds the pure logic of the linkstate simulator:
//! - `graph` → undirected weighted topology with UP/DOWN links
//! - `dijkstra` → single-source shortest paths with first-hop tracking
//! - `router` → one cached routing table per node
//! - `hysteresis` → EMA-filtered link status with a threshold band and hold-down
//! - `session` → the calling layer that sequences the three above
//! - `formats` / `export` → JSON topology import and route export
//!
//! ## Architectural Constraints
//!
//! - No async, no network, no file I/O: bytes in, values out.
//! - No clock: every time-dependent operation takes `now_ms` from the caller.
//! - Every map is a `BTreeMap`, so enumeration order depends only on the
//!   topology.

// =============================================================================
// MODULES
// =============================================================================

pub mod dijkstra;
pub mod export;
pub mod formats;
pub mod graph;
pub mod hysteresis;
pub mod metrics;
pub mod primitives;
pub mod router;
pub mod session;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{Link, LinkKey, LinkStateError, LinkStatus, Node, NodeId};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use dijkstra::{RouteEntry, RouteTable, ShortestPathEngine};
pub use graph::NetworkGraph;
pub use hysteresis::{
    ApplyReport, HysteresisConfig, HysteresisController, HysteresisState, StatusTransition,
};
pub use metrics::{TopologyMetrics, reachable_pairs};
pub use router::RoutingIndex;
pub use session::Session;

// =============================================================================
// RE-EXPORTS: Formats
// =============================================================================

pub use export::{ExportLink, ExportMeta, ExportNode, RouteExport};
pub use formats::{
    ImportSummary, TopologyDocument, TopologyLink, TopologyNode, default_topology, load_topology,
};
