use egui::{Align2, Pos2, Rect, Response, Sense, Ui, Vec2, Widget};

use crate::canvas::Canvas;
use crate::draw::{self, DrawContext};
use crate::events::{Event, EventSink};
use crate::interaction::ConnectState;
use crate::metadata::{Metadata, MAX_ZOOM, MIN_ZOOM};
use crate::settings::{SettingsInteraction, SettingsNavigation, SettingsStyle};

/// Widget for the knowledge-map canvas.
///
/// Borrows a [`Canvas`] per frame and implements [`egui::Widget`]. Each
/// frame it advances the simulation one cooperative step, routes pointer
/// input through the interaction controller, repaints every node and edge at
/// its live coordinates, and publishes resulting [`Event`]s to the sink.
///
/// Zoom/pan never produce events: they act on the view transform only and
/// change no node property.
pub struct CanvasView<'a> {
    canvas: &'a mut Canvas,

    settings_interaction: SettingsInteraction,
    settings_navigation: SettingsNavigation,
    settings_style: SettingsStyle,

    custom_id: Option<String>,

    events_sink: Option<&'a dyn EventSink>,
}

impl<'a> CanvasView<'a> {
    pub fn new(canvas: &'a mut Canvas) -> Self {
        Self {
            canvas,
            settings_interaction: SettingsInteraction::default(),
            settings_navigation: SettingsNavigation::default(),
            settings_style: SettingsStyle::default(),
            custom_id: None,
            events_sink: None,
        }
    }

    /// Makes widget interactive according to the provided settings.
    pub fn with_interactions(mut self, settings: &SettingsInteraction) -> Self {
        self.settings_interaction = *settings;
        self
    }

    /// Modifies default behaviour of navigation settings.
    pub fn with_navigations(mut self, settings: &SettingsNavigation) -> Self {
        self.settings_navigation = *settings;
        self
    }

    /// Modifies default style settings.
    pub fn with_styles(mut self, settings: &SettingsStyle) -> Self {
        self.settings_style = *settings;
        self
    }

    /// Sets a custom unique id for this widget instance. Useful when more
    /// than one canvas lives in the same UI.
    pub fn with_id(mut self, custom_id: Option<String>) -> Self {
        self.custom_id = custom_id;
        self
    }

    /// Supply a sink that will receive canvas events. Works with
    /// `crossbeam::channel::Sender<Event>`, closures via [`crate::FnSink`],
    /// or custom implementations.
    pub fn with_event_sink(mut self, sink: &'a dyn EventSink) -> Self {
        self.events_sink = Some(sink);
        self
    }

    fn publish(&self, events: Vec<Event>) {
        if let Some(sink) = self.events_sink {
            for event in events {
                sink.send(event);
            }
        }
    }

    fn compute_bounds(&self, meta: &mut Metadata) {
        meta.reset_bounds();
        for (_, n) in self.canvas.graph().nodes_iter() {
            meta.process_bounds(n);
        }
    }

    /// Fits the graph to the screen if it is the first frame.
    fn fit_if_first(&self, resp: &Response, meta: &mut Metadata) {
        if !meta.first_frame {
            return;
        }
        if self.settings_navigation.fit_to_screen && self.canvas.graph().node_count() > 0 {
            self.fit_to_screen(&resp.rect, meta);
        }
        meta.first_frame = false;
    }

    fn fit_to_screen(&self, rect: &Rect, meta: &mut Metadata) {
        let bounds = meta.graph_bounds();
        let (min, max) = (bounds.min, bounds.max);
        if !min.x.is_finite()
            || !min.y.is_finite()
            || !max.x.is_finite()
            || !max.y.is_finite()
            || min.x > max.x
            || min.y > max.y
        {
            return;
        }

        let diag = (max - min).max(Vec2::new(1., 1.));
        let graph_size = diag * (1. + self.settings_navigation.screen_padding);
        let zoom_x = rect.width() / graph_size.x;
        let zoom_y = rect.height() / graph_size.y;
        let new_zoom = zoom_x.min(zoom_y).clamp(MIN_ZOOM, MAX_ZOOM);

        let graph_center = (min.to_vec2() + max.to_vec2()) / 2.;
        meta.set_zoom(new_zoom);
        meta.pan = rect.center().to_vec2() - graph_center * meta.zoom();
    }

    fn handle_hover(&mut self, ui: &Ui, resp: &Response, meta: &Metadata, connect_mode: bool) {
        let hovered_edge = match resp.hover_pos() {
            Some(pos) => {
                let node = self.canvas.graph().node_by_screen_pos(meta, pos);
                if node.is_some() {
                    ui.output_mut(|o| o.cursor_icon = egui::CursorIcon::PointingHand);
                }
                if node.is_none() && !connect_mode {
                    self.canvas.graph().edge_by_screen_pos(meta, pos)
                } else {
                    None
                }
            }
            None => None,
        };
        let (g, _, _) = self.canvas.parts();
        g.set_hovered_edge(hovered_edge);
    }

    fn handle_pointer(&mut self, ui: &Ui, resp: &Response, meta: &Metadata) -> Vec<Event> {
        let si = self.settings_interaction;
        let mut events = Vec::new();

        if si.connect_mode {
            // Only the click handler is active while connecting.
            if resp.clicked() {
                if let Some(pos) = resp.hover_pos() {
                    if let Some(idx) = self.canvas.graph().node_by_screen_pos(meta, pos) {
                        let (g, _, ctl) = self.canvas.parts();
                        events.extend(ctl.node_click(g, idx, true));
                    }
                }
            }
            return events;
        }

        let pointer = ui.input(|i| i.pointer.latest_pos());
        let pressed = ui.input(|i| i.pointer.primary_pressed());
        let released = ui.input(|i| i.pointer.primary_released());

        if pressed && resp.hovered() {
            if let Some(pos) = pointer {
                let (g, sim, ctl) = self.canvas.parts();
                ctl.pointer_down(g, sim, meta, pos, false);
            }
        }

        if self.canvas.controller().dragging() {
            if let Some(pos) = pointer {
                let (g, _, ctl) = self.canvas.parts();
                events.extend(ctl.pointer_move(g, meta, pos));
            }
        }

        if released {
            let (g, sim, ctl) = self.canvas.parts();
            events.extend(ctl.pointer_up(g, sim, si.physics_enabled, false));
        }

        // First click of a double click is reported as a single click first,
        // same as the underlying event stream.
        if resp.double_clicked() {
            if let Some(pos) = resp.hover_pos() {
                if let Some(idx) = self.canvas.graph().node_by_screen_pos(meta, pos) {
                    let (g, _, ctl) = self.canvas.parts();
                    events.extend(ctl.node_double_click(g, idx, false));
                }
            }
        }

        // Clicks on empty canvas reach edges; nodes always win hit testing.
        if resp.clicked() {
            if let Some(pos) = resp.hover_pos() {
                if self.canvas.graph().node_by_screen_pos(meta, pos).is_none() {
                    if let Some(edge) = self.canvas.graph().edge_by_screen_pos(meta, pos) {
                        let (_, _, ctl) = self.canvas.parts();
                        ctl.edge_click(edge);
                    }
                }
            }
        }

        events
    }

    fn handle_navigation(&mut self, ui: &Ui, resp: &Response, meta: &mut Metadata) {
        if !self.settings_navigation.zoom_and_pan {
            return;
        }
        if !self.canvas.controller().pan_zoom_allowed() {
            return;
        }

        ui.input(|i| {
            let delta = i.zoom_delta();
            if delta == 1. {
                return;
            }
            let step = self.settings_navigation.zoom_step * (delta - 1.).signum();
            self.zoom(&resp.rect, step, i.pointer.hover_pos(), meta);
        });

        if resp.dragged() && self.canvas.graph().dragged_node().is_none() {
            meta.pan += resp.drag_delta();
        }
    }

    /// Zooms around the given center, compensating pan so the point under
    /// the cursor stays put. The clamp is applied before compensation so pan
    /// never drifts at the zoom limits.
    fn zoom(&self, rect: &Rect, delta: f32, zoom_center: Option<Pos2>, meta: &mut Metadata) {
        let center_pos = zoom_center.unwrap_or_else(|| rect.center()).to_vec2();
        let graph_center = (center_pos - meta.pan) / meta.zoom();
        let new_zoom = (meta.zoom() * (1. + delta)).clamp(MIN_ZOOM, MAX_ZOOM);

        meta.pan += graph_center * meta.zoom() - graph_center * new_zoom;
        meta.set_zoom(new_zoom);
    }

    fn show_delete_confirm(&mut self, ui: &Ui) -> Vec<Event> {
        if self.canvas.controller().pending_edge_delete().is_none() {
            return Vec::new();
        }

        let mut decision = None;
        egui::Window::new("Remove connection?")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, Vec2::ZERO)
            .show(ui.ctx(), |ui| {
                ui.label("This removes the connection between the two nodes.");
                ui.horizontal(|ui| {
                    if ui.button("Remove").clicked() {
                        decision = Some(true);
                    }
                    if ui.button("Cancel").clicked() {
                        decision = Some(false);
                    }
                });
            });

        match decision {
            Some(true) => {
                let (g, _, ctl) = self.canvas.parts();
                ctl.confirm_edge_delete(g)
            }
            Some(false) => {
                let (_, _, ctl) = self.canvas.parts();
                ctl.cancel_edge_delete();
                Vec::new()
            }
            None => Vec::new(),
        }
    }
}

impl Widget for &mut CanvasView<'_> {
    fn ui(self, ui: &mut Ui) -> Response {
        let si = self.settings_interaction;
        let (resp, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        let mut meta = Metadata::new(self.custom_id.clone()).load(ui);

        // Mirror the externally-owned toggles before anything else runs.
        {
            let (_, sim, ctl) = self.canvas.parts();
            ctl.sync_connect_mode(si.connect_mode);
            sim.set_physics_enabled(si.physics_enabled);
        }

        self.compute_bounds(&mut meta);
        self.fit_if_first(&resp, &mut meta);

        // Physics step plus cache write-back. Structural rebuilds happen in
        // Canvas::sync, never inside a tick.
        let center = meta.screen_to_canvas_pos(resp.rect.center());
        let tick_events = self.canvas.tick(center, si.physics_enabled);
        self.publish(tick_events);

        self.handle_hover(ui, &resp, &meta, si.connect_mode);
        let pointer_events = self.handle_pointer(ui, &resp, &meta);
        self.publish(pointer_events);
        self.handle_navigation(ui, &resp, &mut meta);

        let dc = DrawContext {
            painter: &painter,
            meta: &meta,
            style: &self.settings_style,
            filter: si.filter,
        };
        draw::draw_edges(&dc, self.canvas.graph());
        let connect_source = match self.canvas.controller().connect_state() {
            ConnectState::AwaitingSecond { source } => self.canvas.graph().index_of(&source),
            ConnectState::Idle => None,
        };
        draw::draw_nodes(&dc, self.canvas.graph(), connect_source);
        if let Some(source) = connect_source {
            if let Some(pointer) = ui.input(|i| i.pointer.latest_pos()) {
                draw::draw_rubber_band(&dc, self.canvas.graph(), source, pointer);
            }
        }

        let confirm_events = self.show_delete_confirm(ui);
        self.publish(confirm_events);

        meta.save(ui);
        ui.ctx().request_repaint();

        resp
    }
}
