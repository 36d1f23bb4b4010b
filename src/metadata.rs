use egui::{Id, Pos2, Rect, Ui, Vec2};
use serde::{Deserialize, Serialize};

use crate::elements::Node;

const KEY_PREFIX: &str = "mindmap_canvas_metadata";

/// Zoom clamp range for the view transform.
pub const MIN_ZOOM: f32 = 0.2;
pub const MAX_ZOOM: f32 = 2.0;

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Bounds {
    min: Pos2,
    max: Pos2,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min: Pos2::new(f32::MAX, f32::MAX),
            max: Pos2::new(f32::MIN, f32::MIN),
        }
    }
}

impl Bounds {
    fn compute_next(&mut self, n: &Node) {
        let loc = n.location();
        let r = n.radius();
        if loc.x - r < self.min.x {
            self.min.x = loc.x - r;
        }
        if loc.x + r > self.max.x {
            self.max.x = loc.x + r;
        }
        if loc.y - r < self.min.y {
            self.min.y = loc.y - r;
        }
        if loc.y + r > self.max.y {
            self.max.y = loc.y + r;
        }
    }
}

/// Per-view navigation state persisted in egui memory between frames, so the
/// canvas tolerates being re-mounted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Metadata {
    /// Whether the frame is the first one
    pub first_frame: bool,
    /// Current pan offset
    pub pan: Vec2,
    /// Current zoom factor, clamped to [`MIN_ZOOM`]..=[`MAX_ZOOM`]
    zoom: f32,
    /// Custom key to identify the metadata
    id: String,
    /// State of bounds iteration
    bounds: Bounds,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            first_frame: true,
            pan: Vec2::default(),
            zoom: 1.,
            id: String::new(),
            bounds: Bounds::default(),
        }
    }
}

impl Metadata {
    pub fn new(id: Option<String>) -> Self {
        Self {
            id: id.unwrap_or_default(),
            ..Default::default()
        }
    }

    pub fn load(self, ui: &Ui) -> Self {
        ui.data_mut(|data| {
            data.get_persisted::<Metadata>(Id::new(self.key()))
                .unwrap_or(self)
        })
    }

    pub fn save(self, ui: &mut Ui) {
        ui.data_mut(|data| {
            data.insert_persisted(Id::new(self.key()), self);
        });
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        if !zoom.is_finite() {
            return;
        }
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn canvas_to_screen_pos(&self, pos: Pos2) -> Pos2 {
        (pos.to_vec2() * self.zoom + self.pan).to_pos2()
    }

    pub fn canvas_to_screen_size(&self, size: f32) -> f32 {
        size * self.zoom
    }

    pub fn screen_to_canvas_pos(&self, pos: Pos2) -> Pos2 {
        ((pos.to_vec2() - self.pan) / self.zoom).to_pos2()
    }

    pub fn process_bounds(&mut self, n: &Node) {
        self.bounds.compute_next(n);
    }

    /// Returns bounding rect of the graph.
    pub fn graph_bounds(&self) -> Rect {
        Rect::from_min_max(self.bounds.min, self.bounds.max)
    }

    /// Resets the bounds iterator.
    pub fn reset_bounds(&mut self) {
        self.bounds = Bounds::default();
    }

    fn key(&self) -> String {
        format!("{KEY_PREFIX}_{}", self.id)
    }
}

/// Resets persisted [`Metadata`] state.
pub fn reset_metadata(ui: &mut Ui, id: Option<String>) {
    Metadata::new(id).save(ui);
}
