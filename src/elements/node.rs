use egui::{Color32, Pos2, Vec2};

use crate::domain::{EntityKind, NodeId};

/// A physics body and visual for one domain entity.
///
/// Position is owned by the simulation while unpinned and by the user (via
/// the pin) while dragged or dropped with physics off. The node never
/// mutates the domain entity it represents; `entity_id` is the opaque way
/// back to it.
#[derive(Clone, Debug)]
pub struct Node {
    id: NodeId,
    kind: EntityKind,
    entity_id: String,
    label: String,

    location: Pos2,
    velocity: Vec2,
    /// Fixed override position; removes the node from free physics motion.
    pin: Option<Pos2>,

    radius: f32,
    color: Color32,

    dragged: bool,
}

impl Node {
    pub fn new(kind: EntityKind, entity_id: &str, label: String, location: Pos2) -> Self {
        let style = kind.style();
        Self {
            id: NodeId::new(kind, entity_id),
            kind,
            entity_id: entity_id.to_string(),
            label,
            location,
            velocity: Vec2::ZERO,
            pin: None,
            radius: style.radius,
            color: style.color,
            dragged: false,
        }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: String) {
        self.label = label;
    }

    pub fn location(&self) -> Pos2 {
        self.location
    }

    /// Non-finite coordinates are discarded; the node keeps its previous
    /// location and its velocity resets.
    pub fn set_location(&mut self, loc: Pos2) {
        if !loc.x.is_finite() || !loc.y.is_finite() {
            self.velocity = Vec2::ZERO;
            return;
        }
        self.location = loc;
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn set_velocity(&mut self, v: Vec2) {
        if !v.x.is_finite() || !v.y.is_finite() {
            self.velocity = Vec2::ZERO;
            return;
        }
        self.velocity = v;
    }

    pub fn pin(&self) -> Option<Pos2> {
        self.pin
    }

    pub fn is_pinned(&self) -> bool {
        self.pin.is_some()
    }

    pub fn set_pin(&mut self, pos: Pos2) {
        if !pos.x.is_finite() || !pos.y.is_finite() {
            return;
        }
        self.pin = Some(pos);
        self.location = pos;
        self.velocity = Vec2::ZERO;
    }

    pub fn clear_pin(&mut self) {
        self.pin = None;
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn color(&self) -> Color32 {
        self.color
    }

    pub fn dragged(&self) -> bool {
        self.dragged
    }

    pub fn set_dragged(&mut self, dragged: bool) {
        self.dragged = dragged;
    }

    /// Circle hit test in canvas coordinates.
    pub fn is_inside(&self, pos: Pos2) -> bool {
        (pos - self.location).length() <= self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node() -> Node {
        Node::new(EntityKind::Topic, "1", "Psychopharm".into(), Pos2::ZERO)
    }

    #[test]
    fn pin_overrides_location_and_zeroes_velocity() {
        let mut n = node();
        n.set_velocity(Vec2::new(3., -2.));
        n.set_pin(Pos2::new(500., 500.));
        assert_eq!(n.location(), Pos2::new(500., 500.));
        assert_eq!(n.velocity(), Vec2::ZERO);
        assert!(n.is_pinned());

        n.clear_pin();
        assert!(!n.is_pinned());
        assert_eq!(n.location(), Pos2::new(500., 500.));
    }

    #[test]
    fn non_finite_location_is_discarded() {
        let mut n = node();
        n.set_location(Pos2::new(10., 20.));
        n.set_location(Pos2::new(f32::NAN, 0.));
        assert_eq!(n.location(), Pos2::new(10., 20.));
    }

    #[test]
    fn hit_test_respects_kind_radius() {
        let n = node();
        assert!(n.is_inside(Pos2::new(59., 0.)));
        assert!(!n.is_inside(Pos2::new(61., 0.)));
    }
}
