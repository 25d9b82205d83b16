//! # Routing Index
//!
//! One cached [`RouteTable`] per node, rebuilt wholesale by `recompute_all`.
//!
//! There is no dirty tracking: after any topology, weight or status change
//! the caller must recompute before reading. A table read in between
//! reflects the graph as of the last recompute.

use crate::dijkstra::{RouteTable, ShortestPathEngine};
use crate::graph::NetworkGraph;
use crate::NodeId;
use std::collections::BTreeMap;

/// Per-source routing tables.
#[derive(Debug, Clone, Default)]
pub struct RoutingIndex {
    tables: BTreeMap<NodeId, RouteTable>,
}

impl RoutingIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every cached table and compute one for each node currently in `graph`.
    pub fn recompute_all(&mut self, graph: &NetworkGraph) {
        self.tables = graph
            .node_ids()
            .map(|id| (id, ShortestPathEngine::compute(graph, id)))
            .collect();
    }

    /// Cached table for `source`, or `None` if it was not present at the last recompute.
    #[must_use]
    pub fn table(&self, source: NodeId) -> Option<&RouteTable> {
        self.tables.get(&source)
    }

    /// All cached tables in ascending source order.
    pub fn tables(&self) -> impl Iterator<Item = &RouteTable> {
        self.tables.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
