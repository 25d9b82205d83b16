//! # Topology Metrics
//!
//! Summary counters over a graph and its routing index, used by the status
//! command and the `/status` endpoint.

use crate::graph::NetworkGraph;
use crate::router::RoutingIndex;
use serde::{Deserialize, Serialize};

/// Counts and weight totals for one graph snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TopologyMetrics {
    pub node_count: usize,
    pub link_count: usize,
    pub up_links: usize,
    pub down_links: usize,
    /// Links an operator forced DOWN.
    pub jammed_links: usize,
    /// Sum of current weights over UP links.
    pub total_up_weight: f64,
    /// `total_up_weight / up_links`, or 0 with no UP links.
    pub mean_up_weight: f64,
}

impl TopologyMetrics {
    /// Compute metrics from a graph.
    #[must_use]
    pub fn from_graph(graph: &NetworkGraph) -> Self {
        let mut metrics = Self {
            node_count: graph.node_count(),
            link_count: graph.link_count(),
            ..Self::default()
        };

        for link in graph.links() {
            if link.manually_jammed {
                metrics.jammed_links += 1;
            }
            if link.status.is_up() {
                metrics.up_links += 1;
                metrics.total_up_weight += link.weight;
            } else {
                metrics.down_links += 1;
            }
        }

        if metrics.up_links > 0 {
            metrics.mean_up_weight = metrics.total_up_weight / metrics.up_links as f64;
        }

        metrics
    }
}

/// Number of ordered (source, destination) pairs with a cached route.
#[must_use]
pub fn reachable_pairs(router: &RoutingIndex) -> usize {
    router.tables().map(|t| t.len()).sum()
}

// =============================================================================
// TESTS
// =============================================================================
