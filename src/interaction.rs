use std::time::Duration;

use egui::{Pos2, Vec2};
use instant::Instant;
use petgraph::stable_graph::{EdgeIndex, NodeIndex};

use crate::domain::{Connection, NodeId};
use crate::events::{
    Event, PayloadConnectionCreateRequest, PayloadConnectionDelete, PayloadConnectionRejected,
    PayloadConnectionSetChange, PayloadNodeClick, PayloadNodeDoubleClick, PayloadNodeMove,
    PayloadNodePositionChange,
};
use crate::graph::Graph;
use crate::metadata::Metadata;
use crate::simulation::ForceSimulation;

/// Screen-space displacement below which a press-release stays a click.
pub const DRAG_THRESHOLD: f32 = 5.;

/// Pan/zoom stays locked for this long after a drag release, so the tail of
/// the gesture cannot turn into a spurious pan.
const NAV_RESUME_DELAY_MS: u64 = 150;

/// One node-drag gesture, from pointer-down to pointer-up. Nodes are held by
/// id, not index: a reconciliation can remove the node (and recycle its
/// index) while the gesture is still in flight.
#[derive(Debug, Clone)]
struct DragSession {
    node: NodeId,
    origin_screen: Pos2,
    /// Offset from pointer to node center at grab time, in canvas space.
    grab_offset: Vec2,
    /// True once displacement crossed [`DRAG_THRESHOLD`].
    started: bool,
}

/// The modal connect workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectState {
    Idle,
    AwaitingSecond { source: NodeId },
}

/// Pointer-driven behavior on top of (and sometimes around) the simulation.
///
/// Exactly one interaction mode is active per pointer session: pan/zoom,
/// drag, or connect. All state lives in explicit sessions with clear
/// start/cancel/commit transitions; the widget feeds it pointer data and
/// publishes whatever events come back.
#[derive(Debug)]
pub struct InteractionController {
    drag: Option<DragSession>,
    connect: ConnectState,
    pending_edge_delete: Option<EdgeIndex>,
    nav_resume_at: Option<Instant>,
    last_gesture_dragged: bool,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionController {
    pub fn new() -> Self {
        Self {
            drag: None,
            connect: ConnectState::Idle,
            pending_edge_delete: None,
            nav_resume_at: None,
            last_gesture_dragged: false,
        }
    }

    pub fn connect_state(&self) -> ConnectState {
        self.connect.clone()
    }

    pub fn dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn pending_edge_delete(&self) -> Option<EdgeIndex> {
        self.pending_edge_delete
    }

    /// Pan/zoom is suspended while a node drag is active and for a short
    /// window after it ends.
    pub fn pan_zoom_allowed(&self) -> bool {
        if self.drag.is_some() {
            return false;
        }
        match self.nav_resume_at {
            Some(at) => Instant::now() >= at,
            None => true,
        }
    }

    /// Mirrors the externally-owned connect toggle. Turning it off cancels
    /// any half-finished connection.
    pub fn sync_connect_mode(&mut self, enabled: bool) {
        if !enabled && self.connect != ConnectState::Idle {
            self.connect = ConnectState::Idle;
        }
    }

    /// Pointer pressed. Outside connect mode a press on a node opens a drag
    /// session and pins the node; in connect mode only clicks matter.
    pub fn pointer_down(
        &mut self,
        g: &mut Graph,
        sim: &mut ForceSimulation,
        meta: &Metadata,
        screen_pos: Pos2,
        connect_mode: bool,
    ) {
        self.last_gesture_dragged = false;
        if connect_mode || self.drag.is_some() {
            return;
        }
        let Some(idx) = g.node_by_screen_pos(meta, screen_pos) else {
            return;
        };

        let canvas_pos = meta.screen_to_canvas_pos(screen_pos);
        let node = g.node_mut(idx).unwrap();
        let grab_offset = node.location() - canvas_pos;
        let node_id = node.id().clone();
        node.set_pin(node.location());
        node.set_dragged(true);
        g.set_dragged_node(Some(idx));

        sim.begin_drag();

        self.drag = Some(DragSession {
            node: node_id,
            origin_screen: screen_pos,
            grab_offset,
            started: false,
        });
    }

    /// Pointer moved. Below the threshold the gesture stays a pending click;
    /// past it the pin tracks the pointer in graph space.
    pub fn pointer_move(&mut self, g: &mut Graph, meta: &Metadata, screen_pos: Pos2) -> Vec<Event> {
        let Some(session) = self.drag.as_mut() else {
            return Vec::new();
        };

        if !session.started {
            let displacement = (screen_pos - session.origin_screen).length();
            if displacement < DRAG_THRESHOLD {
                return Vec::new();
            }
            session.started = true;
        }

        let target = meta.screen_to_canvas_pos(screen_pos) + session.grab_offset;
        let Some(node) = g.node_by_id_mut(&session.node) else {
            // The node was reconciled away mid-gesture.
            return Vec::new();
        };
        node.set_pin(target);

        vec![Event::NodeMove(PayloadNodeMove {
            id: node.id().to_string(),
            position: [node.location().x, node.location().y],
        })]
    }

    /// Pointer released. A gesture that never crossed the threshold is a
    /// click; a drag commits its final position exactly once.
    pub fn pointer_up(
        &mut self,
        g: &mut Graph,
        sim: &mut ForceSimulation,
        physics_enabled: bool,
        connect_mode: bool,
    ) -> Vec<Event> {
        let Some(session) = self.drag.take() else {
            return Vec::new();
        };

        g.set_dragged_node(None);
        let Some(idx) = g.index_of(&session.node) else {
            // The node was reconciled away mid-gesture; nothing to commit.
            sim.end_drag();
            return Vec::new();
        };
        let node = g.node_mut(idx).unwrap();
        node.set_dragged(false);

        if !session.started {
            // Never crossed the threshold: plain click, position untouched.
            return self.node_click(g, idx, connect_mode);
        }

        self.last_gesture_dragged = true;
        let final_pos = node.location();
        if physics_enabled {
            node.clear_pin();
        }
        sim.end_drag();
        self.nav_resume_at = Some(Instant::now() + Duration::from_millis(NAV_RESUME_DELAY_MS));

        let node = g.node(idx).unwrap();
        vec![Event::NodePositionChange(PayloadNodePositionChange {
            kind: node.kind(),
            id: node.id().to_string(),
            position: [final_pos.x, final_pos.y],
        })]
    }

    /// Click on a node: connect-mode state machine or a plain click event.
    pub fn node_click(&mut self, g: &Graph, idx: NodeIndex, connect_mode: bool) -> Vec<Event> {
        if connect_mode {
            return self.connect_click(g, idx);
        }
        let Some(node) = g.node(idx) else {
            return Vec::new();
        };
        vec![Event::NodeClick(PayloadNodeClick {
            id: node.id().to_string(),
            kind: node.kind(),
            entity_id: node.entity_id().to_string(),
        })]
    }

    /// Double-click opens a node. Suppressed in connect mode and after a
    /// gesture that turned into a drag.
    pub fn node_double_click(&self, g: &Graph, idx: NodeIndex, connect_mode: bool) -> Vec<Event> {
        if connect_mode || self.last_gesture_dragged {
            return Vec::new();
        }
        let Some(node) = g.node(idx) else {
            return Vec::new();
        };
        vec![Event::NodeDoubleClick(PayloadNodeDoubleClick {
            id: node.id().to_string(),
            kind: node.kind(),
            entity_id: node.entity_id().to_string(),
        })]
    }

    fn connect_click(&mut self, g: &Graph, idx: NodeIndex) -> Vec<Event> {
        let Some(clicked) = g.node(idx).map(|n| n.id().clone()) else {
            return Vec::new();
        };
        match std::mem::replace(&mut self.connect, ConnectState::Idle) {
            ConnectState::Idle => {
                self.connect = ConnectState::AwaitingSecond { source: clicked };
                Vec::new()
            }
            ConnectState::AwaitingSecond { source } => {
                if source == clicked {
                    // Clicking the source again is an unambiguous "never mind".
                    return Vec::new();
                }
                if g.has_edge_between(&source, &clicked) {
                    return vec![Event::ConnectionRejected(PayloadConnectionRejected {
                        source: source.to_string(),
                        target: clicked.to_string(),
                    })];
                }
                vec![Event::ConnectionCreateRequest(
                    PayloadConnectionCreateRequest {
                        source: source.to_string(),
                        target: clicked.to_string(),
                    },
                )]
            }
        }
    }

    /// Click on an edge arms the delete confirmation; nothing is emitted
    /// until the user confirms.
    pub fn edge_click(&mut self, idx: EdgeIndex) {
        self.pending_edge_delete = Some(idx);
    }

    /// User confirmed the armed deletion: the edge is removed and both the
    /// deletion and the surviving connection set are published.
    pub fn confirm_edge_delete(&mut self, g: &mut Graph) -> Vec<Event> {
        let Some(idx) = self.pending_edge_delete.take() else {
            return Vec::new();
        };
        let Some(edge) = g.remove_edge(idx) else {
            return Vec::new();
        };

        vec![
            Event::ConnectionDelete(PayloadConnectionDelete {
                connection_id: edge.id().to_string(),
            }),
            Event::ConnectionSetChange(PayloadConnectionSetChange {
                connections: connection_list(g),
            }),
        ]
    }

    /// User declined: all state unchanged.
    pub fn cancel_edge_delete(&mut self) {
        self.pending_edge_delete = None;
    }
}

/// The current edge set as domain connections.
fn connection_list(g: &Graph) -> Vec<Connection> {
    g.edges_iter()
        .filter_map(|(idx, e)| {
            let (s, t) = g.edge_endpoints(idx)?;
            Some(Connection {
                id: Some(e.id().to_string()),
                source: g.node(s)?.id().to_string(),
                target: g.node(t)?.id().to_string(),
                kind: Some(e.kind().to_string()),
                label: e.label().map(ToString::to_string),
            })
        })
        .collect()
}
