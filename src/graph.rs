use std::collections::HashMap;

use egui::Pos2;
use petgraph::stable_graph::{DefaultIx, EdgeIndex, NodeIndex, StableGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences, IntoNodeReferences};
use petgraph::Undirected;

use crate::domain::NodeId;
use crate::elements::{EdgeLink, Node};
use crate::metadata::Metadata;

/// Screen-space tolerance for edge hit testing.
const EDGE_HIT_TOLERANCE: f32 = 8.;

type StableGraphType = StableGraph<Node, EdgeLink, Undirected, DefaultIx>;

/// Wrapper around [`petgraph::stable_graph::StableGraph`] keeping the
/// id → index map and per-frame interaction bookkeeping.
///
/// Edges are undirected: connections are symmetric for duplicate checks and
/// rendering.
#[derive(Debug, Default, Clone)]
pub struct Graph {
    g: StableGraphType,
    ids: HashMap<NodeId, NodeIndex>,

    dragged_node: Option<NodeIndex>,
    hovered_edge: Option<EdgeIndex>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.g.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.g.edge_count()
    }

    pub fn add_node(&mut self, node: Node) -> NodeIndex {
        let id = node.id().clone();
        let idx = self.g.add_node(node);
        self.ids.insert(id, idx);
        idx
    }

    /// Removes a node and all edges touching it.
    pub fn remove_node(&mut self, id: &NodeId) -> Option<Node> {
        let idx = self.ids.remove(id)?;
        if self.dragged_node == Some(idx) {
            self.dragged_node = None;
        }
        self.g.remove_node(idx)
    }

    pub fn add_edge(
        &mut self,
        source: &NodeId,
        target: &NodeId,
        link: EdgeLink,
    ) -> Option<EdgeIndex> {
        let (s, t) = (self.index_of(source)?, self.index_of(target)?);
        Some(self.g.add_edge(s, t, link))
    }

    pub fn remove_edge(&mut self, idx: EdgeIndex) -> Option<EdgeLink> {
        if self.hovered_edge == Some(idx) {
            self.hovered_edge = None;
        }
        self.g.remove_edge(idx)
    }

    /// Drops every edge, keeping nodes and their motion state intact.
    pub fn clear_edges(&mut self) {
        self.hovered_edge = None;
        let idxs: Vec<_> = self.g.edge_indices().collect();
        for idx in idxs {
            self.g.remove_edge(idx);
        }
    }

    pub fn index_of(&self, id: &NodeId) -> Option<NodeIndex> {
        self.ids.get(id).copied()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.ids.contains_key(id)
    }

    pub fn node(&self, idx: NodeIndex) -> Option<&Node> {
        self.g.node_weight(idx)
    }

    pub fn node_mut(&mut self, idx: NodeIndex) -> Option<&mut Node> {
        self.g.node_weight_mut(idx)
    }

    pub fn node_by_id(&self, id: &NodeId) -> Option<&Node> {
        self.node(self.index_of(id)?)
    }

    pub fn node_by_id_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        let idx = self.index_of(id)?;
        self.node_mut(idx)
    }

    pub fn edge(&self, idx: EdgeIndex) -> Option<&EdgeLink> {
        self.g.edge_weight(idx)
    }

    pub fn edge_mut(&mut self, idx: EdgeIndex) -> Option<&mut EdgeLink> {
        self.g.edge_weight_mut(idx)
    }

    pub fn edge_endpoints(&self, idx: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.g.edge_endpoints(idx)
    }

    pub fn nodes_iter(&self) -> impl Iterator<Item = (NodeIndex, &Node)> {
        self.g.node_references()
    }

    pub fn nodes_iter_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.g.node_weights_mut()
    }

    pub fn node_indices(&self) -> Vec<NodeIndex> {
        self.g.node_indices().collect()
    }

    pub fn edges_iter(&self) -> impl Iterator<Item = (EdgeIndex, &EdgeLink)> {
        self.g.edge_references().map(|e| (e.id(), e.weight()))
    }

    pub fn neighbors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.g.neighbors(idx)
    }

    pub fn degree(&self, idx: NodeIndex) -> usize {
        self.g.edges(idx).count()
    }

    /// Symmetric duplicate check: true if any edge joins the unordered pair.
    pub fn has_edge_between(&self, a: &NodeId, b: &NodeId) -> bool {
        let (Some(a), Some(b)) = (self.index_of(a), self.index_of(b)) else {
            return false;
        };
        self.g.edges_connecting(a, b).next().is_some()
    }

    pub fn edge_index_by_id(&self, id: &str) -> Option<EdgeIndex> {
        self.edges_iter()
            .find(|(_, e)| e.id() == id)
            .map(|(idx, _)| idx)
    }

    /// Finds a node under the given screen position. Linear scan; a spatial
    /// index is overkill for the node counts a personal map reaches.
    pub fn node_by_screen_pos(&self, meta: &Metadata, screen_pos: Pos2) -> Option<NodeIndex> {
        let pos = meta.screen_to_canvas_pos(screen_pos);
        self.nodes_iter()
            .find(|(_, n)| n.is_inside(pos))
            .map(|(idx, _)| idx)
    }

    /// Finds an edge under the given screen position, skipping positions that
    /// hit a node (nodes win).
    pub fn edge_by_screen_pos(&self, meta: &Metadata, screen_pos: Pos2) -> Option<EdgeIndex> {
        let pos = meta.screen_to_canvas_pos(screen_pos);
        let tolerance = EDGE_HIT_TOLERANCE / meta.zoom().max(f32::EPSILON);
        for (idx, _) in self.edges_iter() {
            let Some((s, t)) = self.g.edge_endpoints(idx) else {
                continue;
            };
            let (Some(start), Some(end)) = (self.node(s), self.node(t)) else {
                continue;
            };
            if start.is_inside(pos) || end.is_inside(pos) {
                continue;
            }
            if distance_to_segment(pos, start.location(), end.location()) <= tolerance {
                return Some(idx);
            }
        }
        None
    }

    pub fn dragged_node(&self) -> Option<NodeIndex> {
        self.dragged_node
    }

    pub fn set_dragged_node(&mut self, idx: Option<NodeIndex>) {
        self.dragged_node = idx;
    }

    pub fn hovered_edge(&self) -> Option<EdgeIndex> {
        self.hovered_edge
    }

    pub fn set_hovered_edge(&mut self, idx: Option<EdgeIndex>) {
        self.hovered_edge = idx;
    }
}

fn distance_to_segment(p: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_sq();
    if len_sq == 0. {
        return (p - a).length();
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0., 1.);
    (p - (a + ab * t)).length()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EntityKind;

    fn node(kind: EntityKind, id: &str, x: f32, y: f32) -> Node {
        Node::new(kind, id, id.to_string(), Pos2::new(x, y))
    }

    fn link(id: &str) -> EdgeLink {
        EdgeLink::new(id.to_string(), "related".to_string(), None)
    }

    #[test]
    fn duplicate_check_is_symmetric() {
        let mut g = Graph::new();
        g.add_node(node(EntityKind::Topic, "1", 0., 0.));
        g.add_node(node(EntityKind::Case, "2", 100., 0.));
        let a = NodeId::from("topic-1");
        let b = NodeId::from("case-2");

        assert!(!g.has_edge_between(&a, &b));
        g.add_edge(&a, &b, link("e1"));
        assert!(g.has_edge_between(&a, &b));
        assert!(g.has_edge_between(&b, &a));
    }

    #[test]
    fn removing_node_drops_its_edges_and_id() {
        let mut g = Graph::new();
        g.add_node(node(EntityKind::Topic, "1", 0., 0.));
        g.add_node(node(EntityKind::Case, "2", 100., 0.));
        let a = NodeId::from("topic-1");
        let b = NodeId::from("case-2");
        g.add_edge(&a, &b, link("e1"));

        g.remove_node(&a);
        assert!(!g.contains(&a));
        assert_eq!(g.edge_count(), 0);
        assert_eq!(g.node_count(), 1);
    }

    #[test]
    fn segment_distance() {
        let d = distance_to_segment(Pos2::new(5., 5.), Pos2::new(0., 0.), Pos2::new(10., 0.));
        assert!((d - 5.).abs() < f32::EPSILON);
        let d = distance_to_segment(Pos2::new(-5., 0.), Pos2::new(0., 0.), Pos2::new(10., 0.));
        assert!((d - 5.).abs() < f32::EPSILON);
    }
}
