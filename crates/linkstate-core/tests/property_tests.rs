//! # Property-Based Tests
//!
//! Determinism and correctness invariants of the routing core, checked over
//! random topologies with proptest.

use linkstate_core::{
    HysteresisConfig, HysteresisController, LinkStatus, NetworkGraph, NodeId, RoutingIndex,
    ShortestPathEngine,
};
use proptest::collection::vec;
use proptest::prelude::*;
use std::collections::{BTreeSet, VecDeque};

// =============================================================================
// HELPERS
// =============================================================================

/// Build a graph of `size` nodes from `(a, b, weight, up)` tuples; tuples
/// that index the same node or repeat a pair are dropped by the graph.
fn build_graph(size: usize, links: &[(usize, usize, u8, bool)]) -> (NetworkGraph, Vec<NodeId>) {
    let mut graph = NetworkGraph::new();
    let ids: Vec<NodeId> = (0..size)
        .map(|i| graph.add_node(format!("N{}", i), 0.0, 0.0).expect("node"))
        .collect();

    for &(a, b, weight, up) in links {
        let (u, v) = (ids[a % size], ids[b % size]);
        if graph.add_link(u, v, f64::from(weight)) && !up {
            let _ = graph.set_link_status(u, v, LinkStatus::Down);
        }
    }

    (graph, ids)
}

/// Neighbors of `node` over UP links.
fn up_neighbors(graph: &NetworkGraph, node: NodeId) -> BTreeSet<NodeId> {
    graph
        .links()
        .filter(|link| link.status.is_up())
        .filter_map(|link| link.other(node))
        .collect()
}

/// Nodes reachable from `source` over UP links, excluding `source`.
fn bfs_reachable(graph: &NetworkGraph, source: NodeId) -> BTreeSet<NodeId> {
    let mut seen = BTreeSet::from([source]);
    let mut queue = VecDeque::from([source]);
    while let Some(node) = queue.pop_front() {
        for next in up_neighbors(graph, node) {
            if seen.insert(next) {
                queue.push_back(next);
            }
        }
    }
    seen.remove(&source);
    seen
}

fn topology() -> impl Strategy<Value = (usize, Vec<(usize, usize, u8, bool)>)> {
    (1usize..12).prop_flat_map(|size| {
        (
            Just(size),
            vec((0..size, 0..size, 0u8..10, any::<bool>()), 0..40),
        )
    })
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// A fresh link is found from both orientations as the same record.
    #[test]
    fn add_link_is_symmetric(weight in 0.0f64..100.0) {
        let mut graph = NetworkGraph::new();
        let u = graph.add_node("U", 0.0, 0.0).expect("node");
        let v = graph.add_node("V", 0.0, 0.0).expect("node");

        prop_assert!(graph.add_link(u, v, weight));
        prop_assert_eq!(graph.find_link(u, v), graph.find_link(v, u));
        prop_assert!(graph.find_link(u, v).is_some());
    }

    /// Self-loops fail for every node.
    #[test]
    fn self_loop_always_fails(size in 1usize..20, pick in 0usize..20, weight in 0.0f64..10.0) {
        let (mut graph, ids) = build_graph(size, &[]);
        let node = ids[pick % size];
        prop_assert!(!graph.add_link(node, node, weight));
        prop_assert_eq!(graph.link_count(), 0);
    }

    /// The second link between a pair fails in either orientation.
    #[test]
    fn duplicate_link_always_fails(reverse in any::<bool>(), w1 in 0.0f64..10.0, w2 in 0.0f64..10.0) {
        let mut graph = NetworkGraph::new();
        let u = graph.add_node("U", 0.0, 0.0).expect("node");
        let v = graph.add_node("V", 0.0, 0.0).expect("node");

        prop_assert!(graph.add_link(u, v, w1));
        let (a, b) = if reverse { (v, u) } else { (u, v) };
        prop_assert!(!graph.add_link(a, b, w2));
        prop_assert_eq!(graph.link_count(), 1);
    }

    /// Every table is strictly ascending and never names its own source.
    #[test]
    fn tables_sorted_without_source((size, links) in topology()) {
        let (graph, _) = build_graph(size, &links);
        let mut router = RoutingIndex::new();
        router.recompute_all(&graph);

        prop_assert_eq!(router.len(), size);
        for table in router.tables() {
            prop_assert!(table.entries.windows(2).all(|w| w[0].destination < w[1].destination));
            prop_assert!(table.iter().all(|e| e.destination != table.source));
        }
    }

    /// Destinations are exactly the BFS-reachable set over UP links.
    #[test]
    fn destinations_match_reachability((size, links) in topology()) {
        let (graph, ids) = build_graph(size, &links);

        for &source in &ids {
            let table = ShortestPathEngine::compute(&graph, source);
            let destinations: BTreeSet<NodeId> = table.iter().map(|e| e.destination).collect();
            prop_assert_eq!(destinations, bfs_reachable(&graph, source));
        }
    }

    /// Next hop is always an UP neighbor of the source, and hop counts are positive.
    #[test]
    fn next_hop_is_neighbor((size, links) in topology()) {
        let (graph, ids) = build_graph(size, &links);

        for &source in &ids {
            let neighbors = up_neighbors(&graph, source);
            for entry in ShortestPathEngine::compute(&graph, source).iter() {
                prop_assert!(neighbors.contains(&entry.next_hop));
                prop_assert!(entry.hop_count >= 1);
                prop_assert!(entry.total_cost >= 0.0);
            }
        }
    }

    /// Costs are symmetric on an undirected graph.
    #[test]
    fn costs_are_symmetric((size, links) in topology()) {
        let (graph, ids) = build_graph(size, &links);
        let mut router = RoutingIndex::new();
        router.recompute_all(&graph);

        for &a in &ids {
            for &b in &ids {
                let ab = router.table(a).and_then(|t| t.entry(b)).map(|e| e.total_cost);
                let ba = router.table(b).and_then(|t| t.entry(a)).map(|e| e.total_cost);
                match (ab, ba) {
                    (Some(x), Some(y)) => prop_assert!((x - y).abs() < 1e-9),
                    (None, None) => {}
                    _ => prop_assert!(false, "asymmetric reachability {} <-> {}", a, b),
                }
            }
        }
    }

    /// Same topology, same tables.
    #[test]
    fn recompute_is_deterministic((size, links) in topology()) {
        let (graph, ids) = build_graph(size, &links);
        for &source in &ids {
            prop_assert_eq!(
                ShortestPathEngine::compute(&graph, source),
                ShortestPathEngine::compute(&graph, source)
            );
        }
    }

    /// With the input held at `w`, the filter never moves away from `w`.
    #[test]
    fn ema_converges(
        seed in 0.0f64..10.0,
        target in 0.0f64..10.0,
        alpha in 0.01f64..0.99,
        steps in 1usize..40,
    ) {
        let mut graph = NetworkGraph::new();
        let u = graph.add_node("U", 0.0, 0.0).expect("node");
        let v = graph.add_node("V", 0.0, 0.0).expect("node");
        prop_assert!(graph.add_link(u, v, seed));

        let mut hyst = HysteresisController::new(HysteresisConfig {
            alpha,
            ..HysteresisConfig::default()
        });
        hyst.apply(&mut graph, 0, 0);

        let mut previous = (seed - target).abs();
        for step in 1..=steps {
            prop_assert!(graph.set_link_weight(u, v, target));
            let now = step as u64 * 100;
            hyst.apply(&mut graph, now, 100);

            let filtered = hyst.state(u, v).map(|s| s.filtered).unwrap_or(f64::NAN);
            let distance = (filtered - target).abs();
            prop_assert!(distance <= previous + 1e-12);
            previous = distance;
        }
    }

    /// Flips of one link are never closer together than `hold_ms`.
    #[test]
    fn flips_respect_hold_down(
        samples in vec(0.0f64..4.0, 1..60),
        hold_ms in 0u64..2000,
    ) {
        let mut graph = NetworkGraph::new();
        let u = graph.add_node("U", 0.0, 0.0).expect("node");
        let v = graph.add_node("V", 0.0, 0.0).expect("node");
        prop_assert!(graph.add_link(u, v, 1.0));

        let mut hyst = HysteresisController::new(HysteresisConfig {
            alpha: 0.8,
            hold_ms,
            ..HysteresisConfig::default()
        });

        let mut last_flip: Option<u64> = None;
        for (i, sample) in samples.iter().enumerate() {
            prop_assert!(graph.set_link_weight(u, v, *sample));
            let now = i as u64 * 100;
            for t in hyst.apply(&mut graph, now, 100).transitions {
                if let Some(prev) = last_flip {
                    prop_assert!(t.at_ms - prev >= hold_ms);
                }
                last_flip = Some(t.at_ms);
            }
        }
    }
}
