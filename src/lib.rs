//! Interactive force-directed knowledge-map canvas widget for egui.
//!
//! The host application owns the domain data (topics, cases, tasks,
//! references, connections) and a long-lived [`Canvas`]; each frame it
//! embeds a [`CanvasView`] like any other widget:
//!
//! ```no_run
//! # use mindmap_canvas::{Canvas, CanvasView, MapSnapshot, SettingsInteraction};
//! # fn frame(ui: &mut egui::Ui, canvas: &mut Canvas, snapshot: &MapSnapshot) {
//! canvas.sync(snapshot, true);
//! ui.add(&mut CanvasView::new(canvas)
//!     .with_interactions(&SettingsInteraction::default()));
//! # }
//! ```
//!
//! Reconciliation is fingerprint-driven: edits that do not change the
//! node/edge topology never touch the running simulation, so the layout a
//! user arranged by hand survives unrelated form edits. Everything the user
//! does on the canvas (clicks, drags, connect requests, deletions) comes
//! back through [`EventSink`].

mod adapter;
mod cache;
mod canvas;
mod domain;
mod draw;
mod elements;
mod events;
mod graph;
mod interaction;
mod metadata;
mod settings;
mod simulation;
mod view;

pub use self::cache::PositionCache;
pub use self::canvas::Canvas;
pub use self::domain::{
    CaseEntity, Connection, EntityKind, KindStyle, MapSnapshot, NodeId, ReferenceEntity,
    TaskEntity, Topic,
};
pub use self::elements::{EdgeLink, Node};
pub use self::events::{
    Event, EventSink, FnSink, PayloadBatchPositionChange, PayloadConnectionCreateRequest,
    PayloadConnectionDelete, PayloadConnectionRejected, PayloadConnectionSetChange,
    PayloadNodeClick, PayloadNodeDoubleClick, PayloadNodeMove, PayloadNodePositionChange,
};
pub use self::graph::Graph;
pub use self::interaction::{ConnectState, InteractionController, DRAG_THRESHOLD};
pub use self::metadata::{reset_metadata, Metadata, MAX_ZOOM, MIN_ZOOM};
pub use self::settings::{ActiveFilter, SettingsInteraction, SettingsNavigation, SettingsStyle};
pub use self::simulation::{ForceSimulation, PositionSnapshot, SimulationParams, TickOutcome};
pub use self::view::CanvasView;
