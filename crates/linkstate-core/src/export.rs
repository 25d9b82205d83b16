//! # Route Export
//!
//! Snapshot of the topology and every cached routing table as one JSON
//! document:
//!
//! ```json
//! {
//!   "meta":   { "version": "1.0.0", "timestamp_ms": 1700000000000 },
//!   "nodes":  [{ "id": 1, "label": "R1" }],
//!   "links":  [{ "u": 1, "v": 2, "weight": 1.0, "status": "UP" }],
//!   "routes": { "1": [{ "destination": 2, "next_hop": 2, "total_cost": 1.0, "hop_count": 1 }] }
//! }
//! ```
//!
//! The export reads the routing index as-is. Tables are whatever the last
//! `recompute_all` produced; nodes added since then have no `routes` entry.

use crate::dijkstra::RouteEntry;
use crate::graph::NetworkGraph;
use crate::primitives::EXPORT_FORMAT_VERSION;
use crate::router::RoutingIndex;
use crate::{LinkStateError, LinkStatus, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// DOCUMENT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportMeta {
    pub version: String,
    pub timestamp_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportNode {
    pub id: NodeId,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportLink {
    pub u: NodeId,
    pub v: NodeId,
    pub weight: f64,
    pub status: LinkStatus,
}

/// The full export document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteExport {
    pub meta: ExportMeta,
    pub nodes: Vec<ExportNode>,
    pub links: Vec<ExportLink>,
    /// Stringified source id -> that source's route entries.
    pub routes: BTreeMap<String, Vec<RouteEntry>>,
}

impl RouteExport {
    /// Build the document. `timestamp_ms` is supplied by the caller's clock.
    #[must_use]
    pub fn build(graph: &NetworkGraph, router: &RoutingIndex, timestamp_ms: u64) -> Self {
        let nodes = graph
            .nodes()
            .map(|n| ExportNode {
                id: n.id,
                label: n.label.clone(),
            })
            .collect();

        let links = graph
            .links()
            .map(|l| ExportLink {
                u: l.u,
                v: l.v,
                weight: l.weight,
                status: l.status,
            })
            .collect();

        let routes = graph
            .node_ids()
            .filter_map(|id| router.table(id).map(|t| (id.to_string(), t.entries.clone())))
            .collect();

        Self {
            meta: ExportMeta {
                version: EXPORT_FORMAT_VERSION.to_string(),
                timestamp_ms,
            },
            nodes,
            links,
            routes,
        }
    }

    /// Render with two-space indentation and a trailing newline.
    pub fn to_json_pretty(&self) -> Result<String, LinkStateError> {
        let mut text =
            serde_json::to_string_pretty(self).map_err(|e| LinkStateError::Export(e.to_string()))?;
        text.push('\n');
        Ok(text)
    }
}

// =============================================================================
// TESTS
// =============================================================================
