//! # Core Type Definitions
//!
//! This module contains all core types for the linkstate routing engine:
//! - Node identifiers and the canonical undirected link key (`NodeId`, `LinkKey`)
//! - Topology records (`Node`, `Link`, `LinkStatus`)
//! - Error types (`LinkStateError`)
//!
//! ## Ordering Guarantees
//!
//! Identifier types implement `Ord` so that every map in the core can be a
//! `BTreeMap`. Enumeration order of nodes and links is therefore a function of
//! the topology alone, never of hash seeds or insertion history.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Unique identifier for a node in the topology.
///
/// Assigned from a monotonic counter; an id is never handed out twice, even
/// after the node it named has been removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Canonical key of an undirected link: always `(min, max)`.
///
/// Both orientations of a node pair resolve to the same key, so a link (or
/// any per-link state) is stored exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LinkKey(NodeId, NodeId);

impl LinkKey {
    /// Build the canonical key for the pair `(a, b)` in either orientation.
    #[must_use]
    pub fn new(a: NodeId, b: NodeId) -> Self {
        if a <= b { Self(a, b) } else { Self(b, a) }
    }

    /// The smaller endpoint.
    #[must_use]
    pub const fn low(self) -> NodeId {
        self.0
    }

    /// The larger endpoint.
    #[must_use]
    pub const fn high(self) -> NodeId {
        self.1
    }

    /// Whether `node` is one of the two endpoints.
    #[must_use]
    pub fn touches(self, node: NodeId) -> bool {
        self.0 == node || self.1 == node
    }
}

impl fmt::Display for LinkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.0, self.1)
    }
}

// =============================================================================
// NODE
// =============================================================================

/// A router in the topology.
///
/// Position is presentation data only; routing never reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    pub x: f32,
    pub y: f32,
    /// Liveness flag. Reserved: always `true`, ignored by routing and hysteresis.
    pub up: bool,
}

impl Node {
    #[must_use]
    pub fn new(id: NodeId, label: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            id,
            label: label.into(),
            x,
            y,
            up: true,
        }
    }
}

// =============================================================================
// LINK
// =============================================================================

/// Operational status of a link. Only `Up` links carry traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LinkStatus {
    #[default]
    Up,
    Down,
}

impl LinkStatus {
    /// Wire name used by the export format.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Up => "UP",
            Self::Down => "DOWN",
        }
    }

    #[must_use]
    pub const fn is_up(self) -> bool {
        matches!(self, Self::Up)
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An undirected link between two nodes.
///
/// `u` and `v` keep the orientation the link was created with; lookups go
/// through [`LinkKey`] so either orientation finds it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub u: NodeId,
    pub v: NodeId,
    /// Current cost used by routing. Hysteresis overwrites this with its filtered value.
    pub weight: f64,
    /// Baseline cost before any smoothing.
    pub orig_weight: f64,
    pub status: LinkStatus,
    /// Reserved. While set, weight updates do not move the baseline.
    pub jammed: bool,
    /// Set exactly when a caller forced the link DOWN.
    pub manually_jammed: bool,
}

impl Link {
    /// A fresh UP link with `weight == orig_weight`.
    #[must_use]
    pub fn new(u: NodeId, v: NodeId, weight: f64) -> Self {
        Self {
            u,
            v,
            weight,
            orig_weight: weight,
            status: LinkStatus::Up,
            jammed: false,
            manually_jammed: false,
        }
    }

    #[must_use]
    pub fn key(&self) -> LinkKey {
        LinkKey::new(self.u, self.v)
    }

    /// The endpoint opposite `node`, or `None` if `node` is not an endpoint.
    #[must_use]
    pub fn other(&self, node: NodeId) -> Option<NodeId> {
        if self.u == node {
            Some(self.v)
        } else if self.v == node {
            Some(self.u)
        } else {
            None
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the linkstate system.
///
/// Graph mutators also expose a `bool` form; the `try_*` variants return
/// these errors so callers can report which precondition failed.
#[derive(Debug, Error)]
pub enum LinkStateError {
    /// The referenced node does not exist.
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// A link from a node to itself was requested.
    #[error("Self-loop rejected on node {0}")]
    SelfLoop(NodeId),

    /// A link between the pair already exists (in either orientation).
    #[error("Link already exists: {0} - {1}")]
    DuplicateLink(NodeId, NodeId),

    /// No link exists between the pair.
    #[error("Link not found: {0} - {1}")]
    LinkNotFound(NodeId, NodeId),

    /// Link weights must be finite and non-negative.
    #[error("Invalid link weight: {0}")]
    InvalidWeight(f64),

    /// Every assignable node id has been handed out.
    #[error("Node id space exhausted")]
    NodeIdsExhausted,

    /// Hysteresis parameters out of range.
    #[error("Invalid hysteresis configuration: {0}")]
    InvalidConfig(String),

    /// The topology document could not be read or parsed.
    #[error("Topology load failed: {0}")]
    TopologyLoad(String),

    /// The route export could not be produced or written.
    #[error("Export failed: {0}")]
    Export(String),

    /// The application configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================
