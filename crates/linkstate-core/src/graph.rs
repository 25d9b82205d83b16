//! # Network Graph
//!
//! The single mutable source of topology truth.
//!
//! Nodes are keyed by `NodeId`, links by their canonical [`LinkKey`]. Both
//! maps are `BTreeMap`s, so every enumeration (and everything computed from
//! one, such as shortest paths) is ordered by id rather than by insertion.
//!
//! Mutators come in two forms: a `bool` form that only reports success, and
//! a `try_*` form that names the failed precondition. Neither form notifies
//! the routing index or the hysteresis controller; that sequencing belongs
//! to the caller (see [`crate::Session`]).

use crate::primitives::FIRST_NODE_ID;
use crate::{Link, LinkKey, LinkStateError, LinkStatus, Node, NodeId};
use std::collections::BTreeMap;

/// Reject NaN, infinities and negative costs.
fn validate_weight(weight: f64) -> Result<(), LinkStateError> {
    if weight.is_finite() && weight >= 0.0 {
        Ok(())
    } else {
        Err(LinkStateError::InvalidWeight(weight))
    }
}

// =============================================================================
// GRAPH
// =============================================================================

/// Nodes plus undirected links, with at most one link per unordered pair and
/// no self-loops.
#[derive(Debug, Clone)]
pub struct NetworkGraph {
    /// Node storage: NodeId -> Node
    nodes: BTreeMap<NodeId, Node>,

    /// Link storage: canonical (min, max) pair -> Link
    links: BTreeMap<LinkKey, Link>,

    /// Next id to assign. Independent of the current node count.
    next_node_id: u64,
}

impl Default for NetworkGraph {
    fn default() -> Self {
        Self {
            nodes: BTreeMap::new(),
            links: BTreeMap::new(),
            next_node_id: FIRST_NODE_ID,
        }
    }
}

impl NetworkGraph {
    /// Create a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Nodes
    // -------------------------------------------------------------------------

    /// Add a node and return its freshly assigned id.
    ///
    /// Ids are never reused, so this fails once the id counter would wrap.
    pub fn try_add_node(
        &mut self,
        label: impl Into<String>,
        x: f32,
        y: f32,
    ) -> Result<NodeId, LinkStateError> {
        let next = self
            .next_node_id
            .checked_add(1)
            .ok_or(LinkStateError::NodeIdsExhausted)?;
        let id = NodeId(self.next_node_id);
        self.next_node_id = next;
        self.nodes.insert(id, Node::new(id, label, x, y));
        Ok(id)
    }

    /// Add a node. `None` once the id space is exhausted.
    pub fn add_node(&mut self, label: impl Into<String>, x: f32, y: f32) -> Option<NodeId> {
        self.try_add_node(label, x, y).ok()
    }

    /// Remove a node and every incident link.
    ///
    /// Returns the keys of the links that were dropped with it.
    pub fn try_remove_node(&mut self, id: NodeId) -> Result<Vec<LinkKey>, LinkStateError> {
        if self.nodes.remove(&id).is_none() {
            return Err(LinkStateError::NodeNotFound(id));
        }

        let incident: Vec<LinkKey> = self
            .links
            .keys()
            .filter(|key| key.touches(id))
            .copied()
            .collect();
        for key in &incident {
            self.links.remove(key);
        }

        Ok(incident)
    }

    /// Remove a node and every incident link. `false` if the id is unknown.
    pub fn remove_node(&mut self, id: NodeId) -> bool {
        self.try_remove_node(id).is_ok()
    }

    /// Look up a node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    #[must_use]
    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// All nodes in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// All node ids in ascending order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // -------------------------------------------------------------------------
    // Links
    // -------------------------------------------------------------------------

    /// Insert an UP link between `u` and `v`.
    pub fn try_add_link(
        &mut self,
        u: NodeId,
        v: NodeId,
        weight: f64,
    ) -> Result<(), LinkStateError> {
        if u == v {
            return Err(LinkStateError::SelfLoop(u));
        }
        for endpoint in [u, v] {
            if !self.nodes.contains_key(&endpoint) {
                return Err(LinkStateError::NodeNotFound(endpoint));
            }
        }
        let key = LinkKey::new(u, v);
        if self.links.contains_key(&key) {
            return Err(LinkStateError::DuplicateLink(u, v));
        }
        validate_weight(weight)?;

        self.links.insert(key, Link::new(u, v, weight));
        Ok(())
    }

    /// Insert an UP link. Fails on self-loops, unknown endpoints, an existing
    /// link between the same unordered pair, or an invalid weight.
    pub fn add_link(&mut self, u: NodeId, v: NodeId, weight: f64) -> bool {
        self.try_add_link(u, v, weight).is_ok()
    }

    /// Delete the link between `u` and `v`, returning it.
    pub fn try_remove_link(&mut self, u: NodeId, v: NodeId) -> Result<Link, LinkStateError> {
        self.links
            .remove(&LinkKey::new(u, v))
            .ok_or(LinkStateError::LinkNotFound(u, v))
    }

    /// Delete the link between `u` and `v`. `false` if there is none.
    pub fn remove_link(&mut self, u: NodeId, v: NodeId) -> bool {
        self.try_remove_link(u, v).is_ok()
    }

    /// Force a link's status.
    ///
    /// Any explicit transition to DOWN is an operator override and sets
    /// `manually_jammed`; an explicit UP clears it.
    pub fn try_set_link_status(
        &mut self,
        u: NodeId,
        v: NodeId,
        status: LinkStatus,
    ) -> Result<(), LinkStateError> {
        let link = self.link_mut(u, v)?;
        link.status = status;
        link.manually_jammed = status == LinkStatus::Down;
        Ok(())
    }

    pub fn set_link_status(&mut self, u: NodeId, v: NodeId, status: LinkStatus) -> bool {
        self.try_set_link_status(u, v, status).is_ok()
    }

    /// Set a link's current weight.
    ///
    /// The baseline (`orig_weight`) follows only while the link is not jammed.
    pub fn try_set_link_weight(
        &mut self,
        u: NodeId,
        v: NodeId,
        weight: f64,
    ) -> Result<(), LinkStateError> {
        validate_weight(weight)?;
        let link = self.link_mut(u, v)?;
        link.weight = weight;
        if !link.jammed {
            link.orig_weight = weight;
        }
        Ok(())
    }

    pub fn set_link_weight(&mut self, u: NodeId, v: NodeId, weight: f64) -> bool {
        self.try_set_link_weight(u, v, weight).is_ok()
    }

    /// Unordered lookup: `find_link(u, v)` and `find_link(v, u)` return the same link.
    #[must_use]
    pub fn find_link(&self, u: NodeId, v: NodeId) -> Option<&Link> {
        self.links.get(&LinkKey::new(u, v))
    }

    /// All links in ascending canonical-key order.
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    /// Mutable access for the hysteresis controller's write-back.
    pub(crate) fn links_mut(&mut self) -> impl Iterator<Item = &mut Link> {
        self.links.values_mut()
    }

    #[must_use]
    pub fn contains_link(&self, key: LinkKey) -> bool {
        self.links.contains_key(&key)
    }

    #[must_use]
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    fn link_mut(&mut self, u: NodeId, v: NodeId) -> Result<&mut Link, LinkStateError> {
        self.links
            .get_mut(&LinkKey::new(u, v))
            .ok_or(LinkStateError::LinkNotFound(u, v))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> (NetworkGraph, NodeId, NodeId, NodeId) {
        let mut graph = NetworkGraph::new();
        let a = graph.add_node("A", 0.0, 0.0).expect("node");
        let b = graph.add_node("B", 1.0, 0.0).expect("node");
        let c = graph.add_node("C", 0.0, 1.0).expect("node");
        assert!(graph.add_link(a, b, 1.0));
        assert!(graph.add_link(b, c, 2.0));
        assert!(graph.add_link(c, a, 3.0));
        (graph, a, b, c)
    }

    #[test]
    fn node_ids_are_monotonic_and_start_at_one() {
        let mut graph = NetworkGraph::new();
        let a = graph.add_node("A", 0.0, 0.0).expect("node");
        let b = graph.add_node("B", 0.0, 0.0).expect("node");
        assert_eq!(a, NodeId(1));
        assert_eq!(b, NodeId(2));
    }

    #[test]
    fn removed_ids_are_never_reused() {
        let mut graph = NetworkGraph::new();
        let a = graph.add_node("A", 0.0, 0.0).expect("node");
        let b = graph.add_node("B", 0.0, 0.0).expect("node");
        assert!(graph.remove_node(b));
        let c = graph.add_node("C", 0.0, 0.0).expect("node");

        assert_eq!(c, NodeId(3));
        assert!(graph.contains_node(a));
        assert!(!graph.contains_node(b));
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn exhausted_id_space_refuses_new_nodes() {
        let mut graph = NetworkGraph::new();
        graph.next_node_id = u64::MAX - 1;

        let last = graph.add_node("last", 0.0, 0.0).expect("node");
        assert_eq!(last, NodeId(u64::MAX - 1));

        assert!(matches!(
            graph.try_add_node("overflow", 0.0, 0.0),
            Err(LinkStateError::NodeIdsExhausted)
        ));
        assert!(graph.add_node("overflow", 0.0, 0.0).is_none());
        assert_eq!(graph.node(last).map(|n| n.label.as_str()), Some("last"));
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn remove_unknown_node_fails() {
        let mut graph = NetworkGraph::new();
        assert!(!graph.remove_node(NodeId(42)));
    }

    #[test]
    fn remove_node_drops_incident_links() {
        let (mut graph, a, b, c) = triangle();

        let dropped = graph.try_remove_node(b).expect("remove");

        assert_eq!(dropped.len(), 2);
        assert!(graph.find_link(a, b).is_none());
        assert!(graph.find_link(b, c).is_none());
        assert!(graph.find_link(a, c).is_some());
        assert_eq!(graph.link_count(), 1);
    }

    #[test]
    fn add_link_is_undirected() {
        let mut graph = NetworkGraph::new();
        let a = graph.add_node("A", 0.0, 0.0).expect("node");
        let b = graph.add_node("B", 0.0, 0.0).expect("node");

        assert!(graph.add_link(a, b, 4.0));

        let forward = graph.find_link(a, b).expect("forward");
        let backward = graph.find_link(b, a).expect("backward");
        assert_eq!(forward, backward);
        assert_eq!(forward.status, LinkStatus::Up);
        assert_eq!(forward.orig_weight, 4.0);
    }

    #[test]
    fn add_link_rejects_self_loop() {
        let mut graph = NetworkGraph::new();
        let a = graph.add_node("A", 0.0, 0.0).expect("node");
        assert!(matches!(
            graph.try_add_link(a, a, 1.0),
            Err(LinkStateError::SelfLoop(n)) if n == a
        ));
    }

    #[test]
    fn add_link_rejects_unknown_endpoint() {
        let mut graph = NetworkGraph::new();
        let a = graph.add_node("A", 0.0, 0.0).expect("node");
        assert!(matches!(
            graph.try_add_link(a, NodeId(99), 1.0),
            Err(LinkStateError::NodeNotFound(NodeId(99)))
        ));
        assert!(!graph.add_link(NodeId(99), a, 1.0));
    }

    #[test]
    fn add_link_rejects_duplicate_in_either_orientation() {
        let mut graph = NetworkGraph::new();
        let a = graph.add_node("A", 0.0, 0.0).expect("node");
        let b = graph.add_node("B", 0.0, 0.0).expect("node");

        assert!(graph.add_link(a, b, 1.0));
        assert!(!graph.add_link(a, b, 2.0));
        assert!(!graph.add_link(b, a, 2.0));
        assert_eq!(graph.link_count(), 1);
        assert_eq!(graph.find_link(a, b).map(|l| l.weight), Some(1.0));
    }

    #[test]
    fn add_link_rejects_invalid_weight() {
        let mut graph = NetworkGraph::new();
        let a = graph.add_node("A", 0.0, 0.0).expect("node");
        let b = graph.add_node("B", 0.0, 0.0).expect("node");

        assert!(!graph.add_link(a, b, -1.0));
        assert!(!graph.add_link(a, b, f64::NAN));
        assert!(!graph.add_link(a, b, f64::INFINITY));
        assert!(graph.add_link(a, b, 0.0));
    }

    #[test]
    fn set_link_status_tracks_manual_jam() {
        let (mut graph, a, b, _) = triangle();

        assert!(graph.set_link_status(b, a, LinkStatus::Down));
        let link = graph.find_link(a, b).expect("link");
        assert_eq!(link.status, LinkStatus::Down);
        assert!(link.manually_jammed);

        assert!(graph.set_link_status(a, b, LinkStatus::Up));
        let link = graph.find_link(a, b).expect("link");
        assert_eq!(link.status, LinkStatus::Up);
        assert!(!link.manually_jammed);
    }

    #[test]
    fn set_link_status_on_missing_link_fails() {
        let mut graph = NetworkGraph::new();
        let a = graph.add_node("A", 0.0, 0.0).expect("node");
        let b = graph.add_node("B", 0.0, 0.0).expect("node");
        assert!(!graph.set_link_status(a, b, LinkStatus::Down));
        assert!(!graph.set_link_weight(a, b, 2.0));
    }

    #[test]
    fn set_link_weight_moves_baseline_unless_jammed() {
        let (mut graph, a, b, _) = triangle();

        assert!(graph.set_link_weight(a, b, 5.0));
        let link = graph.find_link(a, b).expect("link");
        assert_eq!(link.weight, 5.0);
        assert_eq!(link.orig_weight, 5.0);

        if let Some(link) = graph.links.get_mut(&LinkKey::new(a, b)) {
            link.jammed = true;
        }
        assert!(graph.set_link_weight(a, b, 9.0));
        let link = graph.find_link(a, b).expect("link");
        assert_eq!(link.weight, 9.0);
        assert_eq!(link.orig_weight, 5.0);
    }

    #[test]
    fn remove_link_either_orientation() {
        let (mut graph, a, b, _) = triangle();
        assert!(graph.remove_link(b, a));
        assert!(graph.find_link(a, b).is_none());
        assert!(!graph.remove_link(a, b));
    }

    #[test]
    fn links_enumerate_in_canonical_order() {
        let mut graph = NetworkGraph::new();
        let a = graph.add_node("A", 0.0, 0.0).expect("node");
        let b = graph.add_node("B", 0.0, 0.0).expect("node");
        let c = graph.add_node("C", 0.0, 0.0).expect("node");
        assert!(graph.add_link(c, b, 1.0));
        assert!(graph.add_link(a, c, 1.0));
        assert!(graph.add_link(b, a, 1.0));

        let keys: Vec<LinkKey> = graph.links().map(Link::key).collect();
        assert_eq!(
            keys,
            vec![LinkKey::new(a, b), LinkKey::new(a, c), LinkKey::new(b, c)]
        );
    }
}
