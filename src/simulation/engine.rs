use std::time::Duration;

use egui::Pos2;
use instant::Instant;
use serde::{Deserialize, Serialize};

use crate::domain::NodeId;
use crate::graph::Graph;

use super::forces;

/// Tunables for the force model and the alpha schedule.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulationParams {
    /// Pairwise repulsion strength (negative repels)
    pub charge_strength: f32,
    /// Rest length of edge springs
    pub link_distance: f32,
    pub link_strength: f32,
    /// Spring relaxation passes per tick
    pub link_iterations: usize,
    /// Added to every node radius for collision exclusion
    pub collision_padding: f32,
    pub collision_iterations: usize,
    /// Per-axis pull toward the canvas center
    pub center_strength: f32,
    /// Velocity retained per tick
    pub velocity_decay: f32,

    /// Alpha on first build
    pub alpha_start: f32,
    /// Convergence rate toward the alpha target
    pub alpha_decay: f32,
    /// Ambient target after warmup; non-zero so the layout keeps breathing
    pub alpha_ambient: f32,
    /// Minimum alpha after a topology change
    pub alpha_topology_bump: f32,
    /// Target while a drag is in flight with physics on
    pub alpha_drag_target: f32,
    /// Alpha below which a realign is considered settled
    pub realign_settle: f32,

    /// Delay before the ambient target kicks in after a (re)build
    pub warmup_ms: u64,
    /// Delay before the ambient target is restored after a drag release
    pub drag_grace_ms: u64,

    /// Distance guard against division by zero
    pub epsilon: f32,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            charge_strength: -350.,
            link_distance: 150.,
            link_strength: 1.5,
            link_iterations: 3,
            collision_padding: 10.,
            collision_iterations: 2,
            center_strength: 0.008,
            velocity_decay: 0.6,

            alpha_start: 0.12,
            alpha_decay: 0.05,
            alpha_ambient: 0.015,
            alpha_topology_bump: 0.08,
            alpha_drag_target: 0.3,
            realign_settle: 0.025,

            warmup_ms: 800,
            drag_grace_ms: 300,

            epsilon: 1e-6,
        }
    }
}

/// Finite node positions published after a tick. The canvas writes these
/// into the position cache; painting reads the graph directly.
#[derive(Debug, Default, Clone)]
pub struct PositionSnapshot {
    positions: Vec<(NodeId, Pos2)>,
}

impl PositionSnapshot {
    fn collect(g: &Graph) -> Self {
        let positions = g
            .nodes_iter()
            .map(|(_, n)| (n.id().clone(), n.location()))
            .filter(|(_, p)| p.x.is_finite() && p.y.is_finite())
            .collect();
        Self { positions }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, Pos2)> {
        self.positions.iter().map(|(id, p)| (id, *p))
    }
}

/// What one tick produced.
#[derive(Debug, Default)]
pub struct TickOutcome {
    pub stepped: bool,
    /// A realign settled this tick; the canvas re-pins (physics off) and
    /// emits the batch position commit.
    pub realign_completed: bool,
    pub snapshot: Option<PositionSnapshot>,
}

/// Owns the physics state and the alpha schedule.
///
/// Two macro-states: uninitialized until the first build, then running.
/// Topology changes never discard the engine; they bump alpha so new
/// elements integrate smoothly. All transitions (warmup → ambient, drag
/// grace, realign settle) are deadline-based and cancel each other.
#[derive(Debug)]
pub struct ForceSimulation {
    params: SimulationParams,

    alpha: f32,
    alpha_target: f32,

    initialized: bool,
    running: bool,
    physics: bool,
    realigning: bool,

    warmup_deadline: Option<Instant>,
    grace_deadline: Option<Instant>,
}

impl Default for ForceSimulation {
    fn default() -> Self {
        Self::new(SimulationParams::default())
    }
}

impl ForceSimulation {
    pub fn new(params: SimulationParams) -> Self {
        Self {
            alpha: params.alpha_start,
            alpha_target: 0.,
            params,
            initialized: false,
            running: false,
            physics: true,
            realigning: false,
            warmup_deadline: None,
            grace_deadline: None,
        }
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_realigning(&self) -> bool {
        self.realigning
    }

    /// First build: start the warmup schedule.
    pub fn start(&mut self, physics_enabled: bool) {
        self.initialized = true;
        self.physics = physics_enabled;
        self.alpha = self.params.alpha_start;
        self.alpha_target = 0.;
        self.running = physics_enabled;
        self.arm_warmup();
        self.grace_deadline = None;
        log::debug!("simulation started, alpha={}", self.alpha);
    }

    /// Topology changed (nodes or edges added/removed). Keeps the engine,
    /// bumps alpha so new elements settle in, restarts the warmup window.
    pub fn notify_topology_changed(&mut self, physics_enabled: bool) {
        if !self.initialized {
            self.start(physics_enabled);
            return;
        }
        self.physics = physics_enabled;
        self.alpha = self.alpha.max(self.params.alpha_topology_bump);
        if physics_enabled || self.realigning {
            self.running = true;
        }
        self.arm_warmup();
        log::debug!("topology changed, alpha bumped to {}", self.alpha);
    }

    /// Reacts to the externally-owned physics toggle. The effect on pinned
    /// nodes is deferred to the next drag-end or realign; only the free-run
    /// state changes here.
    pub fn set_physics_enabled(&mut self, enabled: bool) {
        if enabled == self.physics {
            return;
        }
        self.physics = enabled;
        if enabled {
            if self.initialized {
                self.running = true;
                self.alpha = self.alpha.max(self.params.alpha_topology_bump);
                self.alpha_target = self.params.alpha_ambient;
            }
        } else if !self.realigning {
            self.running = false;
        }
    }

    /// Drag started on a node. With physics on the rest of the graph reacts
    /// live to the dragged node.
    pub fn begin_drag(&mut self) {
        self.grace_deadline = None;
        if self.physics {
            self.alpha_target = self.params.alpha_drag_target;
            self.alpha = self.alpha.max(self.params.alpha_drag_target);
            self.running = true;
        }
    }

    /// Drag released. Ambient alpha is restored after a short grace window
    /// so the released node eases back into the flow.
    pub fn end_drag(&mut self) {
        if self.physics {
            self.grace_deadline =
                Some(Instant::now() + Duration::from_millis(self.params.drag_grace_ms));
        }
    }

    /// Drives alpha to maximum until the layout settles. Canceling semantics:
    /// a second realign simply restarts the schedule; pending warmup/grace
    /// transitions are dropped so nothing else fights over alpha.
    pub fn begin_realign(&mut self) {
        self.realigning = true;
        self.alpha = 1.;
        self.alpha_target = 0.;
        self.running = true;
        self.warmup_deadline = None;
        self.grace_deadline = None;
        log::debug!("realign started");
    }

    /// One cooperative physics step. Never blocks; must be called from the
    /// host's per-frame callback.
    pub fn tick(&mut self, g: &mut Graph, center: Pos2) -> TickOutcome {
        let now = Instant::now();
        if self.warmup_deadline.is_some_and(|d| now >= d) {
            self.warmup_deadline = None;
            self.alpha_target = self.params.alpha_ambient;
        }
        if self.grace_deadline.is_some_and(|d| now >= d) {
            self.grace_deadline = None;
            self.alpha_target = self.params.alpha_ambient;
        }

        if !self.running || g.node_count() == 0 {
            return TickOutcome::default();
        }

        self.alpha += (self.alpha_target - self.alpha) * self.params.alpha_decay;
        forces::step(g, &self.params, self.alpha, center);

        let mut realign_completed = false;
        if self.realigning && self.alpha < self.params.realign_settle {
            self.realigning = false;
            realign_completed = true;
            if self.physics {
                self.alpha_target = self.params.alpha_ambient;
            } else {
                self.running = false;
            }
            log::debug!("realign settled at alpha={}", self.alpha);
        }

        TickOutcome {
            stepped: true,
            realign_completed,
            snapshot: Some(PositionSnapshot::collect(g)),
        }
    }

    fn arm_warmup(&mut self) {
        self.warmup_deadline = Some(Instant::now() + Duration::from_millis(self.params.warmup_ms));
    }
}
