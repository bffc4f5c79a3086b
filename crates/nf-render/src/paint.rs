//! Frame → Vello drawing commands.
//!
//! Shapes stay in canvas space; the frame's canvas→screen transform is
//! handed to Vello so pan and zoom never touch geometry.

use crate::frame::{EdgeCurve, Frame, NodeBox};
use kurbo::{Affine, Circle, Line, Rect, RoundedRect, Stroke};
use nf_core::ports::PortDirection;
use nf_core::{Bounds, NodeCategory, Size};
use peniko::{Color, Fill};
use vello::Scene;

const NODE_RADIUS: f64 = 8.0;
const HEADER_HEIGHT: f64 = 32.0;
const PORT_RADIUS: f64 = 5.0;
const WIDGET_INSET_Y: f64 = 6.0;

/// Colors used by the painter.
#[derive(Debug, Clone)]
pub struct Theme {
    pub background: Color,
    pub grid: Color,
    pub node_fill: Color,
    pub node_border: Color,
    pub selection: Color,
    pub widget_fill: Color,
    pub input_port: Color,
    pub output_port: Color,
    pub edge: Color,
    pub live_edge: Color,
    pub trigger: Color,
    pub action: Color,
    pub logic: Color,
    pub output: Color,
    pub unknown: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color::from_rgba8(0x11, 0x13, 0x18, 0xFF),
            grid: Color::from_rgba8(0xFF, 0xFF, 0xFF, 0x14),
            node_fill: Color::from_rgba8(0x1E, 0x21, 0x29, 0xFF),
            node_border: Color::from_rgba8(0x3A, 0x3F, 0x4B, 0xFF),
            selection: Color::from_rgba8(0x4F, 0x8C, 0xFF, 0xFF),
            widget_fill: Color::from_rgba8(0x2A, 0x2E, 0x38, 0xFF),
            input_port: Color::from_rgba8(0x9C, 0xA3, 0xAF, 0xFF),
            output_port: Color::from_rgba8(0x4F, 0x8C, 0xFF, 0xFF),
            edge: Color::from_rgba8(0x6B, 0x72, 0x80, 0xFF),
            live_edge: Color::from_rgba8(0x4F, 0x8C, 0xFF, 0xC0),
            trigger: Color::from_rgba8(0xF5, 0x9E, 0x0B, 0xFF),
            action: Color::from_rgba8(0x3B, 0x82, 0xF6, 0xFF),
            logic: Color::from_rgba8(0xA8, 0x55, 0xF7, 0xFF),
            output: Color::from_rgba8(0x10, 0xB9, 0x81, 0xFF),
            unknown: Color::from_rgba8(0x6B, 0x72, 0x80, 0xFF),
        }
    }
}

impl Theme {
    pub fn category_color(&self, category: Option<NodeCategory>) -> Color {
        match category {
            Some(NodeCategory::Trigger) => self.trigger,
            Some(NodeCategory::Action) => self.action,
            Some(NodeCategory::Logic) => self.logic,
            Some(NodeCategory::Output) => self.output,
            None => self.unknown,
        }
    }
}

/// Paint a frame into a freshly-cleared scene covering `viewport` pixels.
///
/// Returns the number of draw commands issued.
pub fn paint_frame(scene: &mut Scene, frame: &Frame, theme: &Theme, viewport: Size) -> usize {
    let mut count = 0;
    count += paint_background(scene, frame, theme, viewport);

    // edges under nodes
    for edge in &frame.edges {
        count += paint_edge(scene, frame.transform, edge, theme);
    }
    for node in &frame.nodes {
        count += paint_node(scene, frame.transform, node, theme);
    }
    if let Some(live) = &frame.live {
        let stroke = Stroke::new(2.0).with_dashes(0.0, [6.0, 4.0]);
        scene.stroke(&stroke, frame.transform, theme.live_edge, None, &live.to_bez_path());
        count += 1;
    }

    log::trace!("painted {count} command(s)");
    count
}

// ─── Background ──────────────────────────────────────────────────────────

fn paint_background(scene: &mut Scene, frame: &Frame, theme: &Theme, viewport: Size) -> usize {
    let screen = Rect::new(0.0, 0.0, viewport.width, viewport.height);
    scene.fill(Fill::NonZero, Affine::IDENTITY, theme.background, None, &screen);
    let mut count = 1;

    let step = frame.grid.step;
    // Too dense to be useful when zoomed far out.
    if step < 4.0 {
        return count;
    }
    let stroke = Stroke::new(1.0);
    let mut x = frame.grid.offset.x.rem_euclid(step);
    while x < viewport.width {
        let line = Line::new((x, 0.0), (x, viewport.height));
        scene.stroke(&stroke, Affine::IDENTITY, theme.grid, None, &line);
        count += 1;
        x += step;
    }
    let mut y = frame.grid.offset.y.rem_euclid(step);
    while y < viewport.height {
        let line = Line::new((0.0, y), (viewport.width, y));
        scene.stroke(&stroke, Affine::IDENTITY, theme.grid, None, &line);
        count += 1;
        y += step;
    }
    count
}

// ─── Shape painters ──────────────────────────────────────────────────────

fn to_rect(b: &Bounds) -> Rect {
    Rect::new(b.x, b.y, b.right(), b.bottom())
}

fn paint_edge(scene: &mut Scene, transform: Affine, edge: &EdgeCurve, theme: &Theme) -> usize {
    let (color, width) = if edge.selected {
        (theme.selection, 3.0)
    } else {
        (theme.edge, 2.0)
    };
    scene.stroke(&Stroke::new(width), transform, color, None, &edge.path.to_bez_path());
    1
}

fn paint_node(scene: &mut Scene, transform: Affine, node: &NodeBox, theme: &Theme) -> usize {
    let body: RoundedRect = to_rect(&node.bounds).to_rounded_rect(NODE_RADIUS);
    scene.fill(Fill::NonZero, transform, theme.node_fill, None, &body);

    let header_height = HEADER_HEIGHT.min(node.bounds.height);
    let header = Rect::new(
        node.bounds.x,
        node.bounds.y,
        node.bounds.right(),
        node.bounds.y + header_height,
    )
    .to_rounded_rect((NODE_RADIUS, NODE_RADIUS, 0.0, 0.0));
    scene.fill(
        Fill::NonZero,
        transform,
        theme.category_color(node.category),
        None,
        &header,
    );

    let (border, width) = if node.selected {
        (theme.selection, 2.0)
    } else {
        (theme.node_border, 1.0)
    };
    scene.stroke(&Stroke::new(width), transform, border, None, &body);

    log::trace!("NODE {} ({}) at ({}, {})", node.id, node.label, node.bounds.x, node.bounds.y);
    let mut count = 3;

    for (_, rect) in &node.widgets {
        let r = Rect::new(
            rect.x,
            rect.y + WIDGET_INSET_Y,
            rect.right(),
            rect.bottom() - WIDGET_INSET_Y,
        )
        .to_rounded_rect(4.0);
        scene.fill(Fill::NonZero, transform, theme.widget_fill, None, &r);
        count += 1;
    }

    for port in &node.ports {
        let color = match port.direction {
            PortDirection::Input => theme.input_port,
            PortDirection::Output => theme.output_port,
        };
        let dot = Circle::new((port.point.x, port.point.y), PORT_RADIUS);
        scene.fill(Fill::NonZero, transform, color, None, &dot);
        count += 1;
    }
    count
}
