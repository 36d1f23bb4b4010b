use std::collections::HashMap;

use egui::{Pos2, Vec2};
use petgraph::stable_graph::NodeIndex;

use crate::graph::Graph;

use super::engine::SimulationParams;

/// Working copy of one node's motion state for a single step. Pinned bodies
/// still exert forces on the rest of the graph; they just never move.
struct Body {
    pos: Pos2,
    vel: Vec2,
    radius: f32,
}

/// Runs one full force pass and integrates the result back into the graph.
/// All velocity changes are scaled by `alpha`, so a settled simulation barely
/// moves while a freshly bumped one reorganizes quickly.
pub(super) fn step(g: &mut Graph, params: &SimulationParams, alpha: f32, center: Pos2) {
    let indices = g.node_indices();
    if indices.is_empty() {
        return;
    }

    let mut bodies: Vec<Body> = Vec::with_capacity(indices.len());
    let mut slots: HashMap<NodeIndex, usize> = HashMap::with_capacity(indices.len());
    for (slot, &idx) in indices.iter().enumerate() {
        let n = g.node(idx).unwrap();
        bodies.push(Body {
            pos: n.location(),
            vel: n.velocity(),
            radius: n.radius(),
        });
        slots.insert(idx, slot);
    }

    apply_charge(&mut bodies, params, alpha);
    apply_links(g, &slots, &mut bodies, params, alpha);
    apply_collision(&mut bodies, params);
    apply_centering(&mut bodies, center, params, alpha);

    for (slot, &idx) in indices.iter().enumerate() {
        let n = g.node_mut(idx).unwrap();
        if let Some(pin) = n.pin() {
            n.set_location(pin);
            n.set_velocity(Vec2::ZERO);
            continue;
        }
        let vel = bodies[slot].vel * params.velocity_decay;
        n.set_velocity(vel);
        n.set_location(bodies[slot].pos + n.velocity());
    }
}

/// Pairwise repulsion; negative strength pushes nodes apart.
fn apply_charge(bodies: &mut [Body], params: &SimulationParams, alpha: f32) {
    for i in 0..bodies.len() {
        for j in (i + 1)..bodies.len() {
            let delta = bodies[j].pos - bodies[i].pos;
            let dist_sq = delta.length_sq().max(params.epsilon);
            let w = params.charge_strength * alpha / dist_sq;
            bodies[i].vel += delta * w;
            bodies[j].vel -= delta * w;
        }
    }
}

/// Spring force along edges with degree bias, relaxed over several
/// iterations per tick so chains straighten out without oscillating.
fn apply_links(
    g: &Graph,
    slots: &HashMap<NodeIndex, usize>,
    bodies: &mut [Body],
    params: &SimulationParams,
    alpha: f32,
) {
    let links: Vec<(usize, usize, f32)> = g
        .edges_iter()
        .filter_map(|(idx, _)| {
            let (s, t) = g.edge_endpoints(idx)?;
            let bias = g.degree(s) as f32 / (g.degree(s) + g.degree(t)).max(1) as f32;
            Some((*slots.get(&s)?, *slots.get(&t)?, bias))
        })
        .collect();
    if links.is_empty() {
        return;
    }

    for _ in 0..params.link_iterations {
        for &(s, t, bias) in &links {
            let predicted_s = bodies[s].pos + bodies[s].vel;
            let predicted_t = bodies[t].pos + bodies[t].vel;
            let mut delta = predicted_t - predicted_s;
            let len = delta.length().max(params.epsilon);
            delta *= (len - params.link_distance) / len * alpha * params.link_strength;
            bodies[t].vel -= delta * bias;
            bodies[s].vel += delta * (1. - bias);
        }
    }
}

/// Iterative pairwise separation with exclusion radius
/// `node radius + collision padding` per node. Larger bodies move less.
fn apply_collision(bodies: &mut [Body], params: &SimulationParams) {
    for _ in 0..params.collision_iterations {
        for i in 0..bodies.len() {
            for j in (i + 1)..bodies.len() {
                let ri = bodies[i].radius + params.collision_padding;
                let rj = bodies[j].radius + params.collision_padding;
                let min_dist = ri + rj;

                let predicted_i = bodies[i].pos + bodies[i].vel;
                let predicted_j = bodies[j].pos + bodies[j].vel;
                let mut delta = predicted_j - predicted_i;
                let mut len = delta.length();
                if len >= min_dist {
                    continue;
                }
                if len < params.epsilon {
                    // Perfectly overlapping bodies get a deterministic nudge.
                    delta = Vec2::new(min_dist * 0.01, 0.);
                    len = delta.length();
                }
                let overlap = (min_dist - len) / len;
                let push = delta * overlap;
                let wi = rj * rj / (ri * ri + rj * rj);
                bodies[i].vel -= push * wi;
                bodies[j].vel += push * (1. - wi);
            }
        }
    }
}

/// Two weak forces, independent per axis, pulling everything toward the
/// canvas center so disconnected clusters never drift off screen.
fn apply_centering(bodies: &mut [Body], center: Pos2, params: &SimulationParams, alpha: f32) {
    for body in bodies {
        body.vel.x += (center.x - body.pos.x) * params.center_strength * alpha;
        body.vel.y += (center.y - body.pos.y) * params.center_strength * alpha;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EntityKind, NodeId};
    use crate::elements::{EdgeLink, Node};

    fn graph_with_pair(d: f32) -> Graph {
        let mut g = Graph::new();
        g.add_node(Node::new(EntityKind::Topic, "1", "a".into(), Pos2::new(0., 0.)));
        g.add_node(Node::new(EntityKind::Topic, "2", "b".into(), Pos2::new(d, 0.)));
        g
    }

    fn distance(g: &Graph) -> f32 {
        let a = g.node_by_id(&NodeId::from("topic-1")).unwrap().location();
        let b = g.node_by_id(&NodeId::from("topic-2")).unwrap().location();
        (b - a).length()
    }

    #[test]
    fn repulsion_pushes_nodes_apart() {
        // Beyond collision range, so only the charge force acts.
        let mut g = graph_with_pair(200.);
        let before = distance(&g);
        for _ in 0..10 {
            step(&mut g, &SimulationParams::default(), 0.3, Pos2::new(100., 0.));
        }
        assert!(distance(&g) > before, "nodes should move apart");
    }

    #[test]
    fn linked_nodes_pull_toward_link_distance() {
        let mut g = graph_with_pair(800.);
        g.add_edge(
            &NodeId::from("topic-1"),
            &NodeId::from("topic-2"),
            EdgeLink::new("e".into(), "related".into(), None),
        );
        let before = distance(&g);
        for _ in 0..20 {
            step(&mut g, &SimulationParams::default(), 0.3, Pos2::new(400., 0.));
        }
        assert!(distance(&g) < before, "spring should shrink long edges");
    }

    #[test]
    fn collision_separates_overlapping_nodes() {
        let mut g = graph_with_pair(5.);
        for _ in 0..60 {
            step(&mut g, &SimulationParams::default(), 0.05, Pos2::new(0., 0.));
        }
        let params = SimulationParams::default();
        let min_dist = 2. * (60. + params.collision_padding);
        assert!(
            distance(&g) > min_dist * 0.5,
            "overlapping nodes should separate, got {}",
            distance(&g)
        );
    }

    #[test]
    fn pinned_node_does_not_move_but_still_repels() {
        let mut g = graph_with_pair(50.);
        g.node_by_id_mut(&NodeId::from("topic-1"))
            .unwrap()
            .set_pin(Pos2::new(0., 0.));
        for _ in 0..10 {
            step(&mut g, &SimulationParams::default(), 0.3, Pos2::new(25., 0.));
        }
        let pinned = g.node_by_id(&NodeId::from("topic-1")).unwrap();
        assert_eq!(pinned.location(), Pos2::new(0., 0.));
        let free = g.node_by_id(&NodeId::from("topic-2")).unwrap();
        assert!(free.location().x > 50., "free node should be pushed away");
    }
}
