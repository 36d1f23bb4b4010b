use serde::{Deserialize, Serialize};

use crate::domain::EntityKind;

/// Non-destructive node-kind filter. Filtered-out nodes are dimmed but keep
/// participating in physics and collision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActiveFilter {
    #[default]
    All,
    Kind(EntityKind),
}

impl ActiveFilter {
    pub fn matches(self, kind: EntityKind) -> bool {
        match self {
            ActiveFilter::All => true,
            ActiveFilter::Kind(k) => k == kind,
        }
    }
}

/// Externally-owned interaction toggles the canvas reacts to.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SettingsInteraction {
    /// Free physics motion. Off means nodes stay pinned where dropped and
    /// only Realign moves them.
    pub physics_enabled: bool,

    /// Modal two-click connection workflow. While on, dragging and
    /// double-click are suppressed.
    pub connect_mode: bool,

    /// Active node-kind filter.
    pub filter: ActiveFilter,
}

impl Default for SettingsInteraction {
    fn default() -> Self {
        Self {
            physics_enabled: true,
            connect_mode: false,
            filter: ActiveFilter::All,
        }
    }
}

impl SettingsInteraction {
    pub fn with_physics_enabled(mut self, enabled: bool) -> Self {
        self.physics_enabled = enabled;
        self
    }

    pub fn with_connect_mode(mut self, enabled: bool) -> Self {
        self.connect_mode = enabled;
        self
    }

    pub fn with_filter(mut self, filter: ActiveFilter) -> Self {
        self.filter = filter;
        self
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SettingsNavigation {
    /// Fit graph to the screen on the first frame
    pub fit_to_screen: bool,

    /// Zoom and pan
    pub zoom_and_pan: bool,

    /// Padding around the graph when fitting to screen
    pub screen_padding: f32,

    /// Zoom step
    pub zoom_step: f32,
}

impl Default for SettingsNavigation {
    fn default() -> Self {
        Self {
            fit_to_screen: true,
            zoom_and_pan: true,
            screen_padding: 0.3,
            zoom_step: 0.1,
        }
    }
}

impl SettingsNavigation {
    pub fn with_fit_to_screen(mut self, enabled: bool) -> Self {
        self.fit_to_screen = enabled;
        self
    }

    pub fn with_zoom_and_pan(mut self, enabled: bool) -> Self {
        self.zoom_and_pan = enabled;
        self
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SettingsStyle {
    /// Opacity multiplier applied to nodes and edges outside the active
    /// filter.
    pub dim_opacity: f32,

    /// Draw node labels
    pub labels_always: bool,

    /// Draw edge labels where a connection carries one
    pub edge_labels: bool,
}

impl Default for SettingsStyle {
    fn default() -> Self {
        Self {
            dim_opacity: 0.2,
            labels_always: true,
            edge_labels: true,
        }
    }
}

impl SettingsStyle {
    pub fn with_dim_opacity(mut self, opacity: f32) -> Self {
        self.dim_opacity = opacity;
        self
    }

    pub fn with_labels_always(mut self, enabled: bool) -> Self {
        self.labels_always = enabled;
        self
    }
}
