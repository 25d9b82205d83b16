//! # Topology Import Format
//!
//! JSON topology documents:
//!
//! ```json
//! {
//!   "nodes": [{ "id": 10, "label": "R1", "x": 100.0, "y": 100.0 }],
//!   "links": [{ "u": 10, "v": 20, "weight": 1.0 }]
//! }
//! ```
//!
//! File ids are local to the document. They may be sparse and are remapped
//! onto fresh graph ids as nodes are added. A link naming a file id that no
//! node declared is skipped, as is any link the graph itself rejects.
//!
//! File I/O happens in the app layer; this module only sees bytes.

use crate::graph::NetworkGraph;
use crate::primitives::{DEFAULT_LINK_WEIGHT, MAX_IMPORT_LINK_COUNT, MAX_IMPORT_NODE_COUNT};
use crate::{LinkStateError, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// DOCUMENT
// =============================================================================

fn default_weight() -> f64 {
    DEFAULT_LINK_WEIGHT
}

/// A node entry. `label` defaults to the stringified file id, position to the origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyNode {
    pub id: u64,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
}

/// A link entry between two file-local ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyLink {
    pub u: u64,
    pub v: u64,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

/// A whole topology document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TopologyDocument {
    #[serde(default)]
    pub nodes: Vec<TopologyNode>,
    #[serde(default)]
    pub links: Vec<TopologyLink>,
}

/// Outcome of applying a document to a graph.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImportSummary {
    pub nodes_added: usize,
    pub links_added: usize,
    /// Links with an unknown file id or rejected by the graph.
    pub skipped_links: usize,
    /// File id -> assigned graph id.
    pub id_map: BTreeMap<u64, NodeId>,
}

impl TopologyDocument {
    /// Parse a document, enforcing the import size limits.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, LinkStateError> {
        let doc: Self = serde_json::from_slice(bytes)
            .map_err(|e| LinkStateError::TopologyLoad(format!("Invalid JSON: {}", e)))?;

        if doc.nodes.len() > MAX_IMPORT_NODE_COUNT {
            return Err(LinkStateError::TopologyLoad(format!(
                "Node count {} exceeds maximum {}",
                doc.nodes.len(),
                MAX_IMPORT_NODE_COUNT
            )));
        }
        if doc.links.len() > MAX_IMPORT_LINK_COUNT {
            return Err(LinkStateError::TopologyLoad(format!(
                "Link count {} exceeds maximum {}",
                doc.links.len(),
                MAX_IMPORT_LINK_COUNT
            )));
        }

        Ok(doc)
    }

    /// Add every node and link of this document to `graph`.
    ///
    /// If a file id is declared twice, both nodes are created and links
    /// resolve to the later one. Fails only if the graph runs out of node ids.
    pub fn apply(&self, graph: &mut NetworkGraph) -> Result<ImportSummary, LinkStateError> {
        let mut summary = ImportSummary::default();

        for node in &self.nodes {
            let label = node
                .label
                .clone()
                .unwrap_or_else(|| node.id.to_string());
            let assigned = graph.try_add_node(label, node.x, node.y)?;
            summary.id_map.insert(node.id, assigned);
            summary.nodes_added += 1;
        }

        for link in &self.links {
            let endpoints = summary
                .id_map
                .get(&link.u)
                .copied()
                .zip(summary.id_map.get(&link.v).copied());
            match endpoints {
                Some((u, v)) if graph.add_link(u, v, link.weight) => summary.links_added += 1,
                _ => summary.skipped_links += 1,
            }
        }

        Ok(summary)
    }
}

/// Parse `bytes` and add the topology to `graph`.
///
/// Nothing is added if the document fails to parse.
pub fn load_topology(
    bytes: &[u8],
    graph: &mut NetworkGraph,
) -> Result<ImportSummary, LinkStateError> {
    TopologyDocument::from_slice(bytes)?.apply(graph)
}

/// The fallback topology used when no document is given: R1 and R2 joined
/// by one link of weight 1.
pub fn default_topology(graph: &mut NetworkGraph) -> Result<(NodeId, NodeId), LinkStateError> {
    let r1 = graph.try_add_node("R1", 100.0, 100.0)?;
    let r2 = graph.try_add_node("R2", 200.0, 100.0)?;
    graph.try_add_link(r1, r2, DEFAULT_LINK_WEIGHT)?;
    Ok((r1, r2))
}

// =============================================================================
// TESTS
// =============================================================================
