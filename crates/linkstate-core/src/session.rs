//! # Session Module
//!
//! The calling layer over the core components.
//!
//! A `Session` owns one [`NetworkGraph`], one [`RoutingIndex`] and one
//! [`HysteresisController`] and sequences them explicitly:
//!
//! 1. mutate the graph (forwarded operations below),
//! 2. optionally run a hysteresis pass,
//! 3. recompute every routing table.
//!
//! Mutators never recompute on their own; callers decide when routing
//! catches up, via [`Session::recompute`] or [`Session::tick`].
//!
//! Removing a node or link also forgets the hysteresis state of every link
//! that went away, so filter state does not outlive its link. Importing a
//! topology replaces the graph and drops all filter state.

use crate::dijkstra::{RouteTable, ShortestPathEngine};
use crate::formats::{ImportSummary, TopologyDocument};
use crate::graph::NetworkGraph;
use crate::hysteresis::{ApplyReport, HysteresisConfig, HysteresisController};
use crate::router::RoutingIndex;
use crate::{LinkStateError, LinkStatus, NodeId};

/// Graph + routing index + hysteresis controller.
#[derive(Debug, Clone)]
pub struct Session {
    graph: NetworkGraph,
    router: RoutingIndex,
    hysteresis: HysteresisController,
    hysteresis_enabled: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(HysteresisConfig::default())
    }
}

impl Session {
    /// Empty topology, hysteresis enabled with `config`.
    #[must_use]
    pub fn new(config: HysteresisConfig) -> Self {
        Self::with_graph(NetworkGraph::new(), config)
    }

    /// Wrap an existing graph and compute its routes once.
    #[must_use]
    pub fn with_graph(graph: NetworkGraph, config: HysteresisConfig) -> Self {
        let mut session = Self {
            graph,
            router: RoutingIndex::new(),
            hysteresis: HysteresisController::new(config),
            hysteresis_enabled: true,
        };
        session.recompute();
        session
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn graph(&self) -> &NetworkGraph {
        &self.graph
    }

    #[must_use]
    pub fn router(&self) -> &RoutingIndex {
        &self.router
    }

    #[must_use]
    pub fn hysteresis(&self) -> &HysteresisController {
        &self.hysteresis
    }

    /// Cached routing table for `source` as of the last recompute.
    #[must_use]
    pub fn table(&self, source: NodeId) -> Option<&RouteTable> {
        self.router.table(source)
    }

    /// Shortest path on the current graph (not the cached tables).
    #[must_use]
    pub fn path(&self, source: NodeId, destination: NodeId) -> Option<Vec<NodeId>> {
        ShortestPathEngine::path(&self.graph, source, destination)
    }

    #[must_use]
    pub fn hysteresis_enabled(&self) -> bool {
        self.hysteresis_enabled
    }

    pub fn set_hysteresis_enabled(&mut self, enabled: bool) {
        self.hysteresis_enabled = enabled;
    }

    pub fn set_hysteresis_config(&mut self, config: HysteresisConfig) {
        self.hysteresis.set_config(config);
    }

    // -------------------------------------------------------------------------
    // Topology mutation (no recompute)
    // -------------------------------------------------------------------------

    pub fn add_node(
        &mut self,
        label: impl Into<String>,
        x: f32,
        y: f32,
    ) -> Result<NodeId, LinkStateError> {
        self.graph.try_add_node(label, x, y)
    }

    /// Remove a node, its links, and the filter state of those links.
    pub fn remove_node(&mut self, id: NodeId) -> Result<(), LinkStateError> {
        self.graph.try_remove_node(id)?;
        self.hysteresis.retain_links(&self.graph);
        Ok(())
    }

    pub fn add_link(&mut self, u: NodeId, v: NodeId, weight: f64) -> Result<(), LinkStateError> {
        self.graph.try_add_link(u, v, weight)
    }

    /// Remove a link and its filter state.
    pub fn remove_link(&mut self, u: NodeId, v: NodeId) -> Result<(), LinkStateError> {
        self.graph.try_remove_link(u, v)?;
        self.hysteresis.forget(u, v);
        Ok(())
    }

    pub fn set_link_status(
        &mut self,
        u: NodeId,
        v: NodeId,
        status: LinkStatus,
    ) -> Result<(), LinkStateError> {
        self.graph.try_set_link_status(u, v, status)
    }

    pub fn set_link_weight(
        &mut self,
        u: NodeId,
        v: NodeId,
        weight: f64,
    ) -> Result<(), LinkStateError> {
        self.graph.try_set_link_weight(u, v, weight)
    }

    /// Replace the whole topology with a parsed document.
    ///
    /// The new graph is built aside, so a document that fails to parse leaves
    /// the session untouched. On success all filter state is dropped; routes
    /// are not recomputed.
    pub fn import(&mut self, bytes: &[u8]) -> Result<ImportSummary, LinkStateError> {
        let mut graph = NetworkGraph::new();
        let summary = TopologyDocument::from_slice(bytes)?.apply(&mut graph)?;
        self.graph = graph;
        self.hysteresis.reset();
        Ok(summary)
    }

    // -------------------------------------------------------------------------
    // Routing
    // -------------------------------------------------------------------------

    /// Rebuild every routing table from the current graph.
    pub fn recompute(&mut self) {
        self.router.recompute_all(&self.graph);
    }

    /// One simulation step: hysteresis pass (if enabled), then recompute.
    ///
    /// Returns the hysteresis report, or `None` when hysteresis is disabled.
    pub fn tick(&mut self, now_ms: u64, dt_ms: u64) -> Option<ApplyReport> {
        let report = self
            .hysteresis_enabled
            .then(|| self.hysteresis.apply(&mut self.graph, now_ms, dt_ms));
        self.recompute();
        report
    }
}

// =============================================================================
// TESTS
// =============================================================================
