//! # Shortest Path Engine
//!
//! Single-source Dijkstra over the UP subgraph, tracking the first hop of
//! every shortest path so the result can be used directly as a routing table.
//!
//! The engine is stateless: every call rebuilds the adjacency and the
//! distance map from the graph it is given.
//!
//! ## Ordering
//!
//! - Adjacency lists are built in canonical `LinkKey` order.
//! - The priority queue breaks cost ties by lowest node id.
//! - Relaxation is strict (`<`): an equal-cost path found later never
//!   replaces the first one.
//!
//! Together these make results deterministic for a given topology. Which of
//! several equal-cost next hops wins is a consequence of that ordering, not a
//! routing policy.

use crate::graph::NetworkGraph;
use crate::NodeId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};

// =============================================================================
// ROUTE TABLE
// =============================================================================

/// One destination in a routing table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteEntry {
    pub destination: NodeId,
    /// The source's neighbor that begins the shortest path.
    pub next_hop: NodeId,
    /// Sum of link weights along the path.
    pub total_cost: f64,
    /// Number of links along the path.
    pub hop_count: u32,
}

/// Routes from one source to every node it can reach over UP links.
///
/// Entries are strictly ascending by destination and never include the
/// source itself or an unreachable node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteTable {
    pub source: NodeId,
    pub entries: Vec<RouteEntry>,
}

impl RouteTable {
    /// An empty table for `source`.
    #[must_use]
    pub fn new(source: NodeId) -> Self {
        Self {
            source,
            entries: Vec::new(),
        }
    }

    /// Route to `destination`, if reachable.
    #[must_use]
    pub fn entry(&self, destination: NodeId) -> Option<&RouteEntry> {
        self.entries
            .binary_search_by_key(&destination, |e| e.destination)
            .ok()
            .and_then(|idx| self.entries.get(idx))
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// PRIORITY QUEUE ENTRY
// =============================================================================

/// Min-heap entry: lowest cost first, then lowest node id.
#[derive(Debug, Clone, Copy)]
struct QueueEntry {
    cost: f64,
    node: NodeId,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap.
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

// =============================================================================
// SEARCH STATE
// =============================================================================

/// Everything one Dijkstra run learns about the graph.
#[derive(Debug, Default)]
struct Search {
    dist: BTreeMap<NodeId, f64>,
    parent: BTreeMap<NodeId, NodeId>,
    first_hop: BTreeMap<NodeId, NodeId>,
    hops: BTreeMap<NodeId, u32>,
}

impl Search {
    fn distance(&self, node: NodeId) -> f64 {
        self.dist.get(&node).copied().unwrap_or(f64::INFINITY)
    }

    fn into_table(self, source: NodeId) -> RouteTable {
        // BTreeMap iteration yields destinations in ascending order.
        let entries = self
            .dist
            .iter()
            .filter(|(node, cost)| **node != source && cost.is_finite())
            .filter_map(|(node, cost)| {
                let next_hop = self.first_hop.get(node).copied()?;
                Some(RouteEntry {
                    destination: *node,
                    next_hop,
                    total_cost: *cost,
                    hop_count: self.hops.get(node).copied().unwrap_or(0),
                })
            })
            .collect();

        RouteTable { source, entries }
    }
}

// =============================================================================
// ENGINE
// =============================================================================

/// Stateless single-source shortest-path computation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortestPathEngine;

impl ShortestPathEngine {
    /// Routing table for `source`. Unknown sources get an empty table.
    #[must_use]
    pub fn compute(graph: &NetworkGraph, source: NodeId) -> RouteTable {
        if !graph.contains_node(source) {
            return RouteTable::new(source);
        }
        Self::search(graph, source).into_table(source)
    }

    /// Full node sequence of the shortest path, `source` and `destination`
    /// included. `None` if either node is unknown or unreachable.
    #[must_use]
    pub fn path(graph: &NetworkGraph, source: NodeId, destination: NodeId) -> Option<Vec<NodeId>> {
        if !graph.contains_node(source) || !graph.contains_node(destination) {
            return None;
        }
        if source == destination {
            return Some(vec![source]);
        }

        let search = Self::search(graph, source);
        if !search.distance(destination).is_finite() {
            return None;
        }

        let mut path = vec![destination];
        let mut current = destination;
        while current != source {
            current = *search.parent.get(&current)?;
            path.push(current);
            // A parent chain can never be longer than the node set.
            if path.len() > graph.node_count() {
                return None;
            }
        }
        path.reverse();
        Some(path)
    }

    fn search(graph: &NetworkGraph, source: NodeId) -> Search {
        let adjacency = Self::adjacency(graph);

        let mut search = Search {
            dist: graph.node_ids().map(|id| (id, f64::INFINITY)).collect(),
            ..Search::default()
        };
        search.dist.insert(source, 0.0);
        search.hops.insert(source, 0);

        let mut queue = BinaryHeap::new();
        queue.push(QueueEntry {
            cost: 0.0,
            node: source,
        });

        while let Some(QueueEntry { cost, node }) = queue.pop() {
            // Lazy deletion: a newer, cheaper entry for this node was pushed.
            if cost > search.distance(node) {
                continue;
            }

            let node_hops = search.hops.get(&node).copied().unwrap_or(0);
            let node_first_hop = search.first_hop.get(&node).copied();

            let Some(neighbors) = adjacency.get(&node) else {
                continue;
            };
            for &(neighbor, weight) in neighbors {
                let candidate = cost + weight;
                if candidate < search.distance(neighbor) {
                    let first_hop = if node == source {
                        neighbor
                    } else {
                        node_first_hop.unwrap_or(neighbor)
                    };

                    search.dist.insert(neighbor, candidate);
                    search.parent.insert(neighbor, node);
                    search.hops.insert(neighbor, node_hops.saturating_add(1));
                    search.first_hop.insert(neighbor, first_hop);
                    queue.push(QueueEntry {
                        cost: candidate,
                        node: neighbor,
                    });
                }
            }
        }

        search
    }

    /// Adjacency over UP links only; DOWN links are invisible to pathfinding.
    fn adjacency(graph: &NetworkGraph) -> BTreeMap<NodeId, Vec<(NodeId, f64)>> {
        let mut adjacency: BTreeMap<NodeId, Vec<(NodeId, f64)>> = BTreeMap::new();
        for link in graph.links().filter(|l| l.status.is_up()) {
            adjacency.entry(link.u).or_default().push((link.v, link.weight));
            adjacency.entry(link.v).or_default().push((link.u, link.weight));
        }
        adjacency
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LinkStatus;

    fn chain() -> (NetworkGraph, NodeId, NodeId, NodeId) {
        let mut graph = NetworkGraph::new();
        let r1 = graph.add_node("R1", 0.0, 0.0).expect("node");
        let r2 = graph.add_node("R2", 0.0, 0.0).expect("node");
        let r3 = graph.add_node("R3", 0.0, 0.0).expect("node");
        assert!(graph.add_link(r1, r2, 1.0));
        assert!(graph.add_link(r2, r3, 1.0));
        (graph, r1, r2, r3)
    }

    #[test]
    fn chain_routes_through_middle() {
        let (graph, r1, r2, r3) = chain();

        let table = ShortestPathEngine::compute(&graph, r1);

        assert_eq!(
            table.entries,
            vec![
                RouteEntry {
                    destination: r2,
                    next_hop: r2,
                    total_cost: 1.0,
                    hop_count: 1,
                },
                RouteEntry {
                    destination: r3,
                    next_hop: r2,
                    total_cost: 2.0,
                    hop_count: 2,
                },
            ]
        );
    }

    #[test]
    fn down_link_removes_unreachable_destination() {
        let (mut graph, r1, r2, r3) = chain();
        assert!(graph.set_link_status(r2, r3, LinkStatus::Down));

        let table = ShortestPathEngine::compute(&graph, r1);

        assert_eq!(table.len(), 1);
        assert!(table.entry(r2).is_some());
        assert!(table.entry(r3).is_none());
    }

    #[test]
    fn cheaper_detour_beats_direct_link() {
        let mut graph = NetworkGraph::new();
        let a = graph.add_node("A", 0.0, 0.0).expect("node");
        let b = graph.add_node("B", 0.0, 0.0).expect("node");
        let c = graph.add_node("C", 0.0, 0.0).expect("node");
        assert!(graph.add_link(a, c, 10.0));
        assert!(graph.add_link(a, b, 2.0));
        assert!(graph.add_link(b, c, 3.0));

        let table = ShortestPathEngine::compute(&graph, a);
        let to_c = table.entry(c).expect("route to c");

        assert_eq!(to_c.next_hop, b);
        assert_eq!(to_c.total_cost, 5.0);
        assert_eq!(to_c.hop_count, 2);
    }

    #[test]
    fn first_hop_propagates_along_long_paths() {
        let mut graph = NetworkGraph::new();
        let ids: Vec<NodeId> = (0..6)
            .map(|i| graph.add_node(format!("N{i}"), 0.0, 0.0).expect("node"))
            .collect();
        for pair in ids.windows(2) {
            assert!(graph.add_link(pair[0], pair[1], 1.0));
        }

        let table = ShortestPathEngine::compute(&graph, ids[0]);

        assert_eq!(table.len(), 5);
        for entry in table.iter() {
            assert_eq!(entry.next_hop, ids[1]);
        }
        assert_eq!(table.entry(ids[5]).map(|e| e.hop_count), Some(5));
    }

    #[test]
    fn table_is_sorted_and_excludes_source() {
        let mut graph = NetworkGraph::new();
        let hub = graph.add_node("hub", 0.0, 0.0).expect("node");
        let spokes: Vec<NodeId> = (0..5)
            .map(|i| graph.add_node(format!("S{i}"), 0.0, 0.0).expect("node"))
            .collect();
        for (i, spoke) in spokes.iter().enumerate().rev() {
            assert!(graph.add_link(*spoke, hub, (i + 1) as f64));
        }

        let table = ShortestPathEngine::compute(&graph, spokes[2]);

        assert!(table.iter().all(|e| e.destination != spokes[2]));
        assert!(
            table
                .entries
                .windows(2)
                .all(|w| w[0].destination < w[1].destination)
        );
    }

    #[test]
    fn unknown_source_yields_empty_table() {
        let (graph, ..) = chain();
        let table = ShortestPathEngine::compute(&graph, NodeId(404));
        assert!(table.is_empty());
        assert_eq!(table.source, NodeId(404));
    }

    #[test]
    fn isolated_source_yields_empty_table() {
        let mut graph = NetworkGraph::new();
        let lonely = graph.add_node("lonely", 0.0, 0.0).expect("node");
        let _ = graph.add_node("other", 0.0, 0.0).expect("node");
        assert!(ShortestPathEngine::compute(&graph, lonely).is_empty());
    }

    #[test]
    fn zero_weight_links_are_traversed() {
        let mut graph = NetworkGraph::new();
        let a = graph.add_node("A", 0.0, 0.0).expect("node");
        let b = graph.add_node("B", 0.0, 0.0).expect("node");
        assert!(graph.add_link(a, b, 0.0));

        let table = ShortestPathEngine::compute(&graph, a);
        assert_eq!(table.entry(b).map(|e| e.total_cost), Some(0.0));
    }

    #[test]
    fn equal_cost_result_is_independent_of_insertion_order() {
        let build = |reverse: bool| {
            let mut graph = NetworkGraph::new();
            let a = graph.add_node("A", 0.0, 0.0).expect("node");
            let b = graph.add_node("B", 0.0, 0.0).expect("node");
            let c = graph.add_node("C", 0.0, 0.0).expect("node");
            let d = graph.add_node("D", 0.0, 0.0).expect("node");
            let mut links = vec![(a, b), (a, c), (b, d), (c, d)];
            if reverse {
                links.reverse();
            }
            for (u, v) in links {
                assert!(graph.add_link(u, v, 1.0));
            }
            ShortestPathEngine::compute(&graph, a)
        };

        assert_eq!(build(false), build(true));
    }

    #[test]
    fn path_reconstructs_hops() {
        let (graph, r1, r2, r3) = chain();
        assert_eq!(
            ShortestPathEngine::path(&graph, r1, r3),
            Some(vec![r1, r2, r3])
        );
        assert_eq!(ShortestPathEngine::path(&graph, r2, r2), Some(vec![r2]));
    }

    #[test]
    fn path_to_unreachable_is_none() {
        let (mut graph, r1, _, r3) = chain();
        let island = graph.add_node("island", 0.0, 0.0).expect("node");
        assert_eq!(ShortestPathEngine::path(&graph, r1, island), None);
        assert_eq!(ShortestPathEngine::path(&graph, r1, NodeId(999)), None);
        assert!(ShortestPathEngine::path(&graph, r1, r3).is_some());
    }

    #[test]
    fn queue_pops_lowest_cost_then_lowest_id() {
        let mut queue = BinaryHeap::new();
        queue.push(QueueEntry { cost: 2.0, node: NodeId(1) });
        queue.push(QueueEntry { cost: 1.0, node: NodeId(5) });
        queue.push(QueueEntry { cost: 1.0, node: NodeId(3) });

        let order: Vec<NodeId> = std::iter::from_fn(|| queue.pop().map(|e| e.node)).collect();
        assert_eq!(order, vec![NodeId(3), NodeId(5), NodeId(1)]);
    }
}
