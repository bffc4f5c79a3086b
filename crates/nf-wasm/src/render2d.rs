//! Canvas2D software renderer.
//!
//! Draws a [`Frame`] to an HTML `<canvas>` via `CanvasRenderingContext2d`.
//! Geometry stays in canvas space; the frame transform is installed on the
//! context so pan and zoom cost nothing here.

use nf_core::ports::PortDirection;
use nf_core::{Bounds, NodeCategory, WorkflowGraph};
use nf_render::{EdgePath, Frame, NodeBox};
use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

const NODE_RADIUS: f64 = 8.0;
const HEADER_HEIGHT: f64 = 32.0;
const PORT_RADIUS: f64 = 5.0;
const WIDGET_INSET_Y: f64 = 6.0;

/// Theme-dependent colors for the canvas renderer.
pub struct CanvasTheme {
    pub bg: &'static str,
    pub grid: &'static str,
    pub node_fill: &'static str,
    pub node_border: &'static str,
    pub node_text: &'static str,
    pub muted_text: &'static str,
    pub widget_fill: &'static str,
    pub edge: &'static str,
    pub selection: &'static str,
    pub input_port: &'static str,
}

impl CanvasTheme {
    pub fn light() -> Self {
        Self {
            bg: "#F5F5F7",
            grid: "rgba(0, 0, 0, 0.08)",
            node_fill: "#FFFFFF",
            node_border: "#D2D2D7",
            node_text: "#1C1C1E",
            muted_text: "#86868B",
            widget_fill: "#F2F2F5",
            edge: "#8E8E93",
            selection: "#4F8CFF",
            input_port: "#9CA3AF",
        }
    }

    pub fn dark() -> Self {
        Self {
            bg: "#111318",
            grid: "rgba(255, 255, 255, 0.08)",
            node_fill: "#1E2129",
            node_border: "#3A3F4B",
            node_text: "#F5F5F7",
            muted_text: "#98989D",
            widget_fill: "#2A2E38",
            edge: "#6B7280",
            selection: "#4F8CFF",
            input_port: "#9CA3AF",
        }
    }

    pub fn category(&self, category: Option<NodeCategory>) -> &'static str {
        match category {
            Some(NodeCategory::Trigger) => "#F59E0B",
            Some(NodeCategory::Action) => "#3B82F6",
            Some(NodeCategory::Logic) => "#A855F7",
            Some(NodeCategory::Output) => "#10B981",
            None => self.muted_text,
        }
    }
}

/// Render a whole frame. `graph` supplies the widget values shown inside
/// input rows.
pub fn render_frame(
    ctx: &CanvasRenderingContext2d,
    frame: &Frame,
    graph: &WorkflowGraph,
    canvas_width: f64,
    canvas_height: f64,
    theme: &CanvasTheme,
) {
    ctx.set_fill_style_str(theme.bg);
    ctx.fill_rect(0.0, 0.0, canvas_width, canvas_height);
    draw_grid(ctx, frame, canvas_width, canvas_height, theme);

    ctx.save();
    let [a, b, c, d, e, f] = frame.transform.as_coeffs();
    if ctx.set_transform(a, b, c, d, e, f).is_err() {
        log::warn!("canvas rejected view transform");
    }

    for edge in &frame.edges {
        let (color, width) = if edge.selected {
            (theme.selection, 3.0)
        } else {
            (theme.edge, 2.0)
        };
        stroke_edge(ctx, &edge.path, color, width);
    }

    for node in &frame.nodes {
        draw_node(ctx, node, graph, theme);
    }

    if let Some(live) = &frame.live {
        let _ = ctx.set_line_dash(&dash(6.0, 4.0));
        stroke_edge(ctx, live, theme.selection, 2.0);
        let _ = ctx.set_line_dash(&js_sys::Array::new());
    }

    ctx.restore();
}

// ─── Drawing primitives ─────────────────────────────────────────────────

fn draw_grid(
    ctx: &CanvasRenderingContext2d,
    frame: &Frame,
    width: f64,
    height: f64,
    theme: &CanvasTheme,
) {
    let step = frame.grid.step;
    if step < 4.0 {
        return;
    }
    ctx.set_fill_style_str(theme.grid);
    let mut x = frame.grid.offset.x.rem_euclid(step);
    while x < width {
        let mut y = frame.grid.offset.y.rem_euclid(step);
        while y < height {
            ctx.fill_rect(x, y, 1.0, 1.0);
            y += step;
        }
        x += step;
    }
}

fn stroke_edge(ctx: &CanvasRenderingContext2d, path: &EdgePath, color: &str, width: f64) {
    let from = path.source();
    let to = path.target();
    let (c1, c2) = path.controls();
    ctx.set_stroke_style_str(color);
    ctx.set_line_width(width);
    ctx.begin_path();
    ctx.move_to(from.x, from.y);
    ctx.bezier_curve_to(c1.x, c1.y, c2.x, c2.y, to.x, to.y);
    ctx.stroke();
}

fn draw_node(ctx: &CanvasRenderingContext2d, node: &NodeBox, graph: &WorkflowGraph, theme: &CanvasTheme) {
    let Bounds {
        x,
        y,
        width: w,
        height: h,
    } = node.bounds;
    let accent = theme.category(node.category);

    // Body
    rounded_rect_path(ctx, x, y, w, h, NODE_RADIUS);
    ctx.set_fill_style_str(theme.node_fill);
    ctx.fill();
    ctx.set_stroke_style_str(if node.selected { theme.selection } else { theme.node_border });
    ctx.set_line_width(if node.selected { 2.0 } else { 1.0 });
    ctx.stroke();

    // Header stripe + label
    ctx.set_fill_style_str(accent);
    ctx.fill_rect(x, y + NODE_RADIUS, 3.0, HEADER_HEIGHT - NODE_RADIUS);
    ctx.set_font("600 13px Inter, system-ui, sans-serif");
    ctx.set_fill_style_str(theme.node_text);
    ctx.set_text_align("left");
    ctx.set_text_baseline("middle");
    let _ = ctx.fill_text(&node.label, x + 14.0, y + HEADER_HEIGHT / 2.0 + 2.0);

    // Widgets show the node's current value, or the port name when unset.
    let data = graph.node(node.id).map(|n| &n.data);
    ctx.set_font("12px Inter, system-ui, sans-serif");
    for (port, rect) in &node.widgets {
        let inner_y = rect.y + WIDGET_INSET_Y;
        let inner_h = (rect.height - 2.0 * WIDGET_INSET_Y).max(0.0);
        rounded_rect_path(ctx, rect.x, inner_y, rect.width, inner_h, 4.0);
        ctx.set_fill_style_str(theme.widget_fill);
        ctx.fill();

        let (text, color) = match data.and_then(|d| d.get(port)) {
            Some(serde_json::Value::String(s)) => (first_line(s).to_string(), theme.node_text),
            Some(other) => (other.to_string(), theme.node_text),
            None => (port.clone(), theme.muted_text),
        };
        ctx.set_fill_style_str(color);
        let _ = ctx.fill_text(&text, rect.x + 8.0, inner_y + inner_h / 2.0);
    }

    // Port handles
    for anchor in &node.ports {
        let color = match anchor.direction {
            PortDirection::Input => theme.input_port,
            PortDirection::Output => accent,
        };
        ctx.begin_path();
        let _ = ctx.arc(
            anchor.point.x,
            anchor.point.y,
            PORT_RADIUS,
            0.0,
            std::f64::consts::TAU,
        );
        ctx.set_fill_style_str(color);
        ctx.fill();
    }
}

fn first_line(s: &str) -> &str {
    s.lines().next().unwrap_or("")
}

fn dash(on: f64, off: f64) -> js_sys::Array {
    js_sys::Array::of2(&JsValue::from_f64(on), &JsValue::from_f64(off))
}

fn rounded_rect_path(ctx: &CanvasRenderingContext2d, x: f64, y: f64, w: f64, h: f64, r: f64) {
    let r = r.min(w / 2.0).min(h / 2.0);
    ctx.begin_path();
    ctx.move_to(x + r, y);
    ctx.line_to(x + w - r, y);
    ctx.arc_to(x + w, y, x + w, y + r, r).unwrap_or(());
    ctx.line_to(x + w, y + h - r);
    ctx.arc_to(x + w, y + h, x + w - r, y + h, r).unwrap_or(());
    ctx.line_to(x + r, y + h);
    ctx.arc_to(x, y + h, x, y + h - r, r).unwrap_or(());
    ctx.line_to(x, y + r);
    ctx.arc_to(x, y, x + r, y, r).unwrap_or(());
    ctx.close_path();
}
