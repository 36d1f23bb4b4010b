use std::collections::HashSet;

use egui::Pos2;
use rand::Rng;

use crate::cache::PositionCache;
use crate::domain::{EntityKind, MapSnapshot, NodeId};
use crate::elements::{EdgeLink, Node};
use crate::graph::Graph;

/// Spawn region for brand-new nodes with no cached and no domain-provided
/// position: a jittered rectangle so simultaneously-created nodes never
/// overlap perfectly.
const SPAWN_ANCHOR: Pos2 = Pos2::new(200., 200.);
const SPAWN_WIDTH: f32 = 800.;
const SPAWN_HEIGHT: f32 = 600.;

/// Result of one adapter rebuild: the normalized node/edge lists plus the
/// structural fingerprint callers use to tell topology changes from
/// content-only edits.
#[derive(Debug)]
pub struct BuiltGraph {
    pub nodes: Vec<Node>,
    pub edges: Vec<(NodeId, NodeId, EdgeLink)>,
    pub fingerprint: String,
}

/// Converts a domain snapshot into normalized nodes and edges.
///
/// Pure except for consulting the position cache. Position resolution per
/// node: cache hit → exact reuse; domain-supplied position → use; otherwise
/// randomized spawn near the fixed anchor. Edges whose endpoints are not in
/// the current node set are dropped silently.
pub fn rebuild(snapshot: &MapSnapshot, cache: &PositionCache) -> BuiltGraph {
    let mut nodes = Vec::new();

    for t in &snapshot.topics {
        nodes.push(make_node(
            EntityKind::Topic,
            &t.id,
            t.display_label(),
            t.position,
            cache,
        ));
    }
    for c in &snapshot.cases {
        nodes.push(make_node(
            EntityKind::Case,
            &c.id,
            c.display_label(),
            c.position,
            cache,
        ));
    }
    for t in &snapshot.tasks {
        nodes.push(make_node(
            EntityKind::Task,
            &t.id,
            t.display_label(),
            t.position,
            cache,
        ));
    }
    for r in &snapshot.references {
        nodes.push(make_node(
            EntityKind::Reference,
            &r.id,
            r.display_label(),
            r.position,
            cache,
        ));
    }

    let ids: HashSet<&str> = nodes.iter().map(|n| n.id().as_str()).collect();

    let mut edges = Vec::new();
    for conn in &snapshot.connections {
        if !ids.contains(conn.source.as_str()) || !ids.contains(conn.target.as_str()) {
            log::debug!(
                "dropping dangling connection {} ({} -> {})",
                conn.edge_id(),
                conn.source,
                conn.target
            );
            continue;
        }
        edges.push((
            NodeId::from(conn.source.as_str()),
            NodeId::from(conn.target.as_str()),
            EdgeLink::new(conn.edge_id(), conn.kind_or_default(), conn.label.clone()),
        ));
    }

    let fingerprint = fingerprint(&nodes, &edges);

    BuiltGraph {
        nodes,
        edges,
        fingerprint,
    }
}

/// Structural fingerprint: sorted node-id list and sorted edge-id list,
/// serialized. Equal fingerprints mean the topology is unchanged and the
/// running simulation must not be touched.
fn fingerprint(nodes: &[Node], edges: &[(NodeId, NodeId, EdgeLink)]) -> String {
    let mut node_ids: Vec<&str> = nodes.iter().map(|n| n.id().as_str()).collect();
    node_ids.sort_unstable();

    let mut edge_ids: Vec<&str> = edges.iter().map(|(_, _, e)| e.id()).collect();
    edge_ids.sort_unstable();

    format!("{}|{}", node_ids.join(","), edge_ids.join(","))
}

/// Refreshes labels on a live graph from the snapshot without touching
/// positions, velocities, pins, or the edge set. Used on content-only
/// changes.
pub fn refresh_labels(graph: &mut Graph, snapshot: &MapSnapshot) {
    let mut set = |id: NodeId, label: String| {
        if let Some(n) = graph.node_by_id_mut(&id) {
            if n.label() != label {
                n.set_label(label);
            }
        }
    };

    for t in &snapshot.topics {
        set(NodeId::new(EntityKind::Topic, &t.id), t.display_label());
    }
    for c in &snapshot.cases {
        set(NodeId::new(EntityKind::Case, &c.id), c.display_label());
    }
    for t in &snapshot.tasks {
        set(NodeId::new(EntityKind::Task, &t.id), t.display_label());
    }
    for r in &snapshot.references {
        set(NodeId::new(EntityKind::Reference, &r.id), r.display_label());
    }

    for conn in &snapshot.connections {
        if let Some(idx) = graph.edge_index_by_id(&conn.edge_id()) {
            if let Some(e) = graph.edge_mut(idx) {
                e.set_kind(conn.kind_or_default());
                e.set_label(conn.label.clone());
            }
        }
    }
}

fn make_node(
    kind: EntityKind,
    entity_id: &str,
    label: String,
    domain_pos: Option<[f32; 2]>,
    cache: &PositionCache,
) -> Node {
    let id = NodeId::new(kind, entity_id);
    let location = resolve_position(&id, domain_pos, cache);
    Node::new(kind, entity_id, label, location)
}

fn resolve_position(id: &NodeId, domain_pos: Option<[f32; 2]>, cache: &PositionCache) -> Pos2 {
    if let Some(cached) = cache.get(id) {
        return cached;
    }
    if let Some([x, y]) = domain_pos {
        if x.is_finite() && y.is_finite() {
            return Pos2::new(x, y);
        }
    }
    spawn_position()
}

fn spawn_position() -> Pos2 {
    let mut rng = rand::rng();
    Pos2::new(
        SPAWN_ANCHOR.x + rng.random_range(0. ..SPAWN_WIDTH),
        SPAWN_ANCHOR.y + rng.random_range(0. ..SPAWN_HEIGHT),
    )
}
