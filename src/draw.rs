use egui::{Color32, FontFamily, FontId, Painter, Pos2, Shape, Stroke};
use petgraph::stable_graph::NodeIndex;

use crate::graph::Graph;
use crate::metadata::Metadata;
use crate::settings::{ActiveFilter, SettingsStyle};

const EDGE_COLOR: Color32 = Color32::from_rgb(0x94, 0xa3, 0xb8);
const EDGE_WIDTH: f32 = 3.;
const EDGE_HOVER_WIDTH: f32 = 5.;
const NODE_STROKE_WIDTH: f32 = 4.;
const LABEL_FONT_SIZE: f32 = 14.;
const CONNECT_MARK_COLOR: Color32 = Color32::from_rgb(0x22, 0xd3, 0xee);

pub(crate) struct DrawContext<'a> {
    pub painter: &'a Painter,
    pub meta: &'a Metadata,
    pub style: &'a SettingsStyle,
    pub filter: ActiveFilter,
}

/// Paints every edge between its live endpoint coordinates. Called every
/// frame, so edges can never lag behind a mid-drag node.
pub(crate) fn draw_edges(ctx: &DrawContext<'_>, g: &Graph) {
    for (idx, edge) in g.edges_iter() {
        let Some((s, t)) = g.edge_endpoints(idx) else {
            continue;
        };
        let (Some(start), Some(end)) = (g.node(s), g.node(t)) else {
            continue;
        };

        let vec = end.location() - start.location();
        let len = vec.length();
        if len <= f32::EPSILON {
            continue;
        }
        let dir = vec / len;
        let from = ctx
            .meta
            .canvas_to_screen_pos(start.location() + dir * start.radius());
        let to = ctx
            .meta
            .canvas_to_screen_pos(end.location() - dir * end.radius());

        let dimmed =
            !ctx.filter.matches(start.kind()) || !ctx.filter.matches(end.kind());
        let hovered = g.hovered_edge() == Some(idx);

        let width = if hovered { EDGE_HOVER_WIDTH } else { EDGE_WIDTH };
        let mut color = if hovered {
            EDGE_COLOR
        } else {
            EDGE_COLOR.gamma_multiply(0.6)
        };
        if dimmed {
            color = color.gamma_multiply(ctx.style.dim_opacity);
        }

        ctx.painter.line_segment(
            [from, to],
            Stroke::new(ctx.meta.canvas_to_screen_size(width), color),
        );

        if ctx.style.edge_labels {
            if let Some(label) = edge.label() {
                let mid = Pos2::new((from.x + to.x) / 2., (from.y + to.y) / 2.);
                ctx.painter.text(
                    mid,
                    egui::Align2::CENTER_CENTER,
                    label,
                    FontId::new(
                        ctx.meta.canvas_to_screen_size(LABEL_FONT_SIZE * 0.85),
                        FontFamily::Proportional,
                    ),
                    color,
                );
            }
        }
    }
}

/// Paints every node: kind-colored disc, white rim, centered label.
/// Filtered-out nodes are dimmed but stay on the canvas (and in physics).
pub(crate) fn draw_nodes(ctx: &DrawContext<'_>, g: &Graph, connect_source: Option<NodeIndex>) {
    for (idx, node) in g.nodes_iter() {
        let center = ctx.meta.canvas_to_screen_pos(node.location());
        let radius = ctx.meta.canvas_to_screen_size(node.radius());
        let dimmed = !ctx.filter.matches(node.kind());

        let mut fill = node.color();
        let mut rim = Color32::WHITE;
        if dimmed {
            fill = fill.gamma_multiply(ctx.style.dim_opacity);
            rim = rim.gamma_multiply(ctx.style.dim_opacity);
        }

        ctx.painter.circle(
            center,
            radius,
            fill,
            Stroke::new(ctx.meta.canvas_to_screen_size(NODE_STROKE_WIDTH), rim),
        );

        if node.dragged() {
            ctx.painter.circle_stroke(
                center,
                radius * 1.2,
                Stroke::new(
                    ctx.meta.canvas_to_screen_size(2.),
                    Color32::from_rgba_unmultiplied(255, 255, 255, 128),
                ),
            );
        }

        if connect_source == Some(idx) {
            ctx.painter.circle_stroke(
                center,
                radius * 1.25,
                Stroke::new(ctx.meta.canvas_to_screen_size(3.), CONNECT_MARK_COLOR),
            );
        }

        if ctx.style.labels_always {
            let mut text_color = Color32::WHITE;
            if dimmed {
                text_color = text_color.gamma_multiply(ctx.style.dim_opacity);
            }
            ctx.painter.text(
                center,
                egui::Align2::CENTER_CENTER,
                wrap_label(node.label()),
                FontId::new(
                    ctx.meta.canvas_to_screen_size(LABEL_FONT_SIZE),
                    FontFamily::Proportional,
                ),
                text_color,
            );
        }
    }
}

/// The connect-mode feedback line from the source node to the live pointer.
pub(crate) fn draw_rubber_band(ctx: &DrawContext<'_>, g: &Graph, source: NodeIndex, pointer: Pos2) {
    let Some(node) = g.node(source) else {
        return;
    };
    let from = ctx.meta.canvas_to_screen_pos(node.location());
    let stroke = Stroke::new(ctx.meta.canvas_to_screen_size(2.), CONNECT_MARK_COLOR);
    let shapes: Vec<Shape> = Shape::dashed_line(&[from, pointer], stroke, 8., 6.);
    for s in shapes {
        ctx.painter.add(s);
    }
}

/// Long labels wrap onto a second, truncated line so wide nodes stay
/// readable without overflowing the disc.
fn wrap_label(label: &str) -> String {
    let words: Vec<&str> = label.split_whitespace().collect();
    if words.len() <= 2 {
        return label.to_string();
    }
    let rest = words[2..].join(" ");
    let tail: String = if rest.chars().count() > 15 {
        let cut: String = rest.chars().take(15).collect();
        format!("{cut}…")
    } else {
        rest
    };
    format!("{}\n{tail}", words[..2].join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_labels_pass_through() {
        assert_eq!(wrap_label("Mood disorders"), "Mood disorders");
    }

    #[test]
    fn long_labels_wrap_and_truncate() {
        let wrapped = wrap_label("Treatment resistant depression with psychotic features");
        let mut lines = wrapped.lines();
        assert_eq!(lines.next(), Some("Treatment resistant"));
        let second = lines.next().unwrap();
        assert!(second.chars().count() <= 16);
        assert!(second.ends_with('…'));
    }
}
