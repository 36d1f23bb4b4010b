use std::collections::HashMap;

use egui::Pos2;

use crate::domain::NodeId;

/// Last-known node positions, keyed by node id.
///
/// Lives for the lifetime of the canvas instance and survives data
/// reconciliations, so unrelated edits never re-randomize the layout. A node
/// re-created with the same id rehydrates to its last known position.
/// Entries for removed nodes go stale but are harmless.
#[derive(Debug, Default, Clone)]
pub struct PositionCache {
    positions: HashMap<NodeId, Pos2>,
}

impl PositionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &NodeId) -> Option<Pos2> {
        self.positions.get(id).copied()
    }

    /// Stores a position. Non-finite coordinates are never cached.
    pub fn put(&mut self, id: NodeId, pos: Pos2) {
        if !pos.x.is_finite() || !pos.y.is_finite() {
            return;
        }
        self.positions.insert(id, pos);
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
