//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.

use linkstate_core::{
    HysteresisConfig, HysteresisState, LinkStatus, Node, NodeId, RouteEntry, TopologyMetrics,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Topology status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(flatten)]
    pub metrics: TopologyMetrics,
    /// Ordered (source, destination) pairs with a cached route.
    pub reachable_pairs: usize,
    pub hysteresis_enabled: bool,
    /// Links with hysteresis filter state.
    pub tracked_links: usize,
}

// =============================================================================
// TOPOLOGY
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeJson {
    pub id: u64,
    pub label: String,
    pub x: f32,
    pub y: f32,
}

impl From<&Node> for NodeJson {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id.0,
            label: node.label.clone(),
            x: node.x,
            y: node.y,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkJson {
    pub u: u64,
    pub v: u64,
    pub weight: f64,
    pub orig_weight: f64,
    pub status: LinkStatus,
    pub manually_jammed: bool,
}

/// Full topology snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyResponse {
    pub nodes: Vec<NodeJson>,
    pub links: Vec<LinkJson>,
}

/// Outcome of replacing the topology.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyLoadResponse {
    pub nodes_added: usize,
    pub links_added: usize,
    pub skipped_links: usize,
    pub recompute_us: u64,
}

// =============================================================================
// NODE / LINK MUTATION
// =============================================================================

/// Add-node request. Position defaults to the origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddNodeRequest {
    pub label: String,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddNodeResponse {
    pub id: u64,
    pub recompute_us: u64,
}

/// Add-link request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddLinkRequest {
    pub u: u64,
    pub v: u64,
    #[serde(default = "default_link_weight")]
    pub weight: f64,
}

fn default_link_weight() -> f64 {
    linkstate_core::primitives::DEFAULT_LINK_WEIGHT
}

/// Jam (DOWN) or restore (UP) a link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkStatusRequest {
    pub u: u64,
    pub v: u64,
    pub status: LinkStatus,
}

/// Set a link's measured cost.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkWeightRequest {
    pub u: u64,
    pub v: u64,
    pub weight: f64,
}

/// Generic outcome of a mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationResponse {
    pub success: bool,
    pub error: Option<String>,
    /// Duration of the recompute that followed a successful mutation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recompute_us: Option<u64>,
}

impl MutationResponse {
    pub fn success(recompute_us: u64) -> Self {
        Self {
            success: true,
            error: None,
            recompute_us: Some(recompute_us),
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(msg.into()),
            recompute_us: None,
        }
    }
}

// =============================================================================
// ROUTES
// =============================================================================

/// One source's cached routing table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteTableResponse {
    pub source: u64,
    pub entries: Vec<RouteEntry>,
}

/// Shortest path between two nodes, computed on the current graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathResponse {
    pub found: bool,
    pub path: Vec<u64>,
    /// Cost and next hop from the cached table, when present.
    pub route: Option<RouteEntry>,
}

impl PathResponse {
    pub fn not_found() -> Self {
        Self {
            found: false,
            path: vec![],
            route: None,
        }
    }

    pub fn with_path(path: Vec<NodeId>, route: Option<RouteEntry>) -> Self {
        Self {
            found: !path.is_empty(),
            path: path.iter().map(|n| n.0).collect(),
            route,
        }
    }
}

/// Result of an explicit recompute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecomputeResponse {
    pub tables: usize,
    pub reachable_pairs: usize,
    pub recompute_us: u64,
}

// =============================================================================
// HYSTERESIS
// =============================================================================

/// Current hysteresis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HysteresisResponse {
    pub enabled: bool,
    pub config: HysteresisConfig,
    pub tracked_links: usize,
}

/// Partial update; omitted fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HysteresisUpdateRequest {
    pub enabled: Option<bool>,
    pub alpha: Option<f64>,
    pub theta_up: Option<f64>,
    pub theta_down: Option<f64>,
    pub hold_ms: Option<u64>,
}

impl HysteresisUpdateRequest {
    /// Overlay this request on `current`.
    #[must_use]
    pub fn apply_to(&self, current: HysteresisConfig) -> HysteresisConfig {
        HysteresisConfig {
            alpha: self.alpha.unwrap_or(current.alpha),
            theta_up: self.theta_up.unwrap_or(current.theta_up),
            theta_down: self.theta_down.unwrap_or(current.theta_down),
            hold_ms: self.hold_ms.unwrap_or(current.hold_ms),
        }
    }
}

/// Filter state of one link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkStateResponse {
    pub u: u64,
    pub v: u64,
    #[serde(flatten)]
    pub state: HysteresisState,
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

/// Body of every 4xx/5xx response that is not a mutation result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { error: msg.into() }
    }
}
