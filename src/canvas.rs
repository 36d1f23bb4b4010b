use std::collections::{BTreeMap, HashSet};

use egui::Pos2;

use crate::adapter::{self, BuiltGraph};
use crate::cache::PositionCache;
use crate::domain::{MapSnapshot, NodeId};
use crate::events::{Event, PayloadBatchPositionChange};
use crate::graph::Graph;
use crate::interaction::InteractionController;
use crate::simulation::{ForceSimulation, SimulationParams};

/// Long-lived canvas state: graph, position cache, simulation engine and
/// interaction controller. The host owns one per canvas and keeps it across
/// frames; [`crate::CanvasView`] borrows it per frame.
///
/// This is also the explicit engine handle: external "Realign" triggers call
/// [`Canvas::realign`] instead of reaching for ambient globals.
#[derive(Debug)]
pub struct Canvas {
    graph: Graph,
    cache: PositionCache,
    sim: ForceSimulation,
    controller: InteractionController,
    fingerprint: Option<String>,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas {
    pub fn new() -> Self {
        Self::with_params(SimulationParams::default())
    }

    pub fn with_params(params: SimulationParams) -> Self {
        Self {
            graph: Graph::new(),
            cache: PositionCache::new(),
            sim: ForceSimulation::new(params),
            controller: InteractionController::new(),
            fingerprint: None,
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn cache(&self) -> &PositionCache {
        &self.cache
    }

    pub fn simulation(&self) -> &ForceSimulation {
        &self.sim
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    /// Current structural fingerprint, if a sync has happened.
    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    /// Split borrow of graph, simulation and controller. The widget uses it
    /// per frame; hosts and tests can use it to drive interactions without
    /// a Ui.
    pub fn parts(
        &mut self,
    ) -> (
        &mut Graph,
        &mut ForceSimulation,
        &mut InteractionController,
    ) {
        (&mut self.graph, &mut self.sim, &mut self.controller)
    }

    /// Reconciles a fresh domain snapshot.
    ///
    /// Content-only changes (same fingerprint) refresh labels in place and
    /// leave the simulation untouched, which is what keeps unrelated form
    /// edits from jolting the canvas. Topology changes merge the node set in
    /// place (surviving nodes keep position, velocity and pin), rebuild the
    /// edge set, and bump the simulation.
    pub fn sync(&mut self, snapshot: &MapSnapshot, physics_enabled: bool) {
        let built = adapter::rebuild(snapshot, &self.cache);

        if self.fingerprint.as_deref() == Some(built.fingerprint.as_str()) {
            adapter::refresh_labels(&mut self.graph, snapshot);
            return;
        }

        let first_build = self.fingerprint.is_none();
        self.apply(built);

        if first_build {
            self.sim.start(physics_enabled);
        } else {
            self.sim.notify_topology_changed(physics_enabled);
        }
    }

    fn apply(&mut self, built: BuiltGraph) {
        let keep: HashSet<NodeId> = built.nodes.iter().map(|n| n.id().clone()).collect();

        let stale: Vec<NodeId> = self
            .graph
            .nodes_iter()
            .filter(|(_, n)| !keep.contains(n.id()))
            .map(|(_, n)| n.id().clone())
            .collect();
        for id in &stale {
            self.graph.remove_node(id);
        }

        for node in built.nodes {
            if self.graph.contains(node.id()) {
                if let Some(existing) = self.graph.node_by_id_mut(node.id()) {
                    existing.set_label(node.label().to_string());
                }
            } else {
                self.graph.add_node(node);
            }
        }

        self.graph.clear_edges();
        for (source, target, link) in built.edges {
            self.graph.add_edge(&source, &target, link);
        }

        log::debug!(
            "graph reconciled: {} nodes, {} edges ({} removed)",
            self.graph.node_count(),
            self.graph.edge_count(),
            stale.len()
        );
        self.fingerprint = Some(built.fingerprint);
    }

    /// Unpins every node and drives the simulation to maximum energy until
    /// it settles. Safe to invoke mid-drag: the dragged node keeps its pin
    /// (drag takes precedence), and a repeated realign just restarts the
    /// schedule.
    pub fn realign(&mut self) {
        let dragged = self.graph.dragged_node();
        for idx in self.graph.node_indices() {
            if Some(idx) == dragged {
                continue;
            }
            if let Some(n) = self.graph.node_mut(idx) {
                n.clear_pin();
            }
        }
        self.sim.begin_realign();
    }

    /// One cooperative frame step: reacts to the physics toggle, advances
    /// the simulation, writes finite positions back into the cache, and on
    /// realign completion re-pins (physics off) and emits the batch commit.
    pub fn tick(&mut self, center: Pos2, physics_enabled: bool) -> Vec<Event> {
        self.sim.set_physics_enabled(physics_enabled);
        let outcome = self.sim.tick(&mut self.graph, center);

        if let Some(snapshot) = &outcome.snapshot {
            for (id, pos) in snapshot.iter() {
                self.cache.put(id.clone(), pos);
            }
        }

        if !outcome.realign_completed {
            return Vec::new();
        }

        if !physics_enabled {
            for idx in self.graph.node_indices() {
                if let Some(n) = self.graph.node_mut(idx) {
                    n.set_pin(n.location());
                }
            }
        }

        let positions: BTreeMap<String, [f32; 2]> = self
            .graph
            .nodes_iter()
            .map(|(_, n)| (n.id().to_string(), [n.location().x, n.location().y]))
            .collect();
        vec![Event::BatchPositionChange(PayloadBatchPositionChange {
            positions,
        })]
    }
}
