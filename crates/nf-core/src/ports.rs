//! Port geometry: where each named port of a node sits in canvas space.
//!
//! Port rows stack below a fixed header. A row that embeds a widget is
//! taller than a connection-only row. Inputs and outputs are laid out as two
//! independent columns, each starting again at the header offset. The anchor
//! of a port is the *top* of its row: input anchors on the node's left edge,
//! output anchors on its right edge.
//!
//! Every function here is total: unknown node types or port names fall back
//! to the node's top-left corner so rendering can degrade instead of fail.

use crate::config::PortLayout;
use crate::model::{Bounds, Node, Point, Size};
use crate::registry::{NodeSpec, PortSpec};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    Input,
    Output,
}

/// A resolved port handle.
#[derive(Debug, Clone, PartialEq)]
pub struct PortAnchor {
    pub name: String,
    pub direction: PortDirection,
    /// Canvas-space anchor.
    pub point: Point,
    pub has_widget: bool,
}

fn row_height(port: &PortSpec, layout: &PortLayout) -> f64 {
    if port.has_widget() {
        layout.widget_row_height
    } else {
        layout.plain_row_height
    }
}

/// Vertical offsets (relative to the node's top) of every row boundary in a
/// port column: the header offset followed by the cumulative end of each row.
///
/// Entry `i` is the offset of port `i`; the last entry is the column's bottom.
pub fn row_boundaries(ports: &[PortSpec], layout: &PortLayout) -> Vec<f64> {
    let mut out = Vec::with_capacity(ports.len() + 1);
    let mut y = layout.header_offset;
    out.push(y);
    for port in ports {
        y += row_height(port, layout);
        out.push(y);
    }
    out
}

pub fn node_width(spec: Option<&NodeSpec>, layout: &PortLayout) -> f64 {
    spec.and_then(|s| s.width).unwrap_or(layout.default_node_width)
}

/// Drawn size of a node: spec width (or the default) by the taller port
/// column plus footer, never below the minimum height.
pub fn node_size(spec: Option<&NodeSpec>, layout: &PortLayout) -> Size {
    let width = node_width(spec, layout);
    let column = |ports: &[PortSpec]| row_boundaries(ports, layout).last().copied();
    let content = spec
        .map(|s| {
            let inputs = column(s.inputs.as_slice()).unwrap_or(layout.header_offset);
            let outputs = column(s.outputs.as_slice()).unwrap_or(layout.header_offset);
            inputs.max(outputs)
        })
        .unwrap_or(layout.header_offset);
    Size::new(width, (content + layout.footer).max(layout.min_node_height))
}

/// Canvas-space rectangle of a node.
pub fn node_bounds(node: &Node, spec: Option<&NodeSpec>, layout: &PortLayout) -> Bounds {
    let size = node_size(spec, layout);
    Bounds::new(node.position.x, node.position.y, size.width, size.height)
}

/// Canvas-space anchor of a named port.
///
/// Falls back to the node's top-left corner when the type has no spec or the
/// port is not declared in the requested direction.
pub fn resolve_port(
    node: &Node,
    spec: Option<&NodeSpec>,
    port: &str,
    direction: PortDirection,
    layout: &PortLayout,
) -> Point {
    let Some(spec) = spec else {
        log::warn!("no spec for node type `{}`; anchoring {port} at node origin", node.node_type);
        return node.position;
    };
    let ports = match direction {
        PortDirection::Input => &spec.inputs,
        PortDirection::Output => &spec.outputs,
    };
    let Some(index) = ports.iter().position(|p| p.name == port) else {
        log::warn!("`{}` has no {direction:?} port `{port}`", spec.node_type);
        return node.position;
    };

    let offset = row_boundaries(&ports[..index], layout)
        .last()
        .copied()
        .unwrap_or(layout.header_offset);
    let x = match direction {
        PortDirection::Input => node.position.x,
        PortDirection::Output => node.position.x + node_width(Some(spec), layout),
    };
    Point::new(x, node.position.y + offset)
}

/// Every port of a node with its anchor, inputs first.
pub fn port_anchors(node: &Node, spec: Option<&NodeSpec>, layout: &PortLayout) -> Vec<PortAnchor> {
    let Some(spec) = spec else {
        return Vec::new();
    };
    let width = node_width(Some(spec), layout);
    let mut out = Vec::with_capacity(spec.inputs.len() + spec.outputs.len());
    for (direction, ports, x) in [
        (PortDirection::Input, &spec.inputs, node.position.x),
        (PortDirection::Output, &spec.outputs, node.position.x + width),
    ] {
        let rows = row_boundaries(ports, layout);
        for (port, offset) in ports.iter().zip(rows) {
            out.push(PortAnchor {
                name: port.name.clone(),
                direction,
                point: Point::new(x, node.position.y + offset),
                has_widget: port.has_widget(),
            });
        }
    }
    out
}

/// Canvas-space rectangle of the widget embedded in an input row, if the
/// port exists and carries one.
pub fn widget_rect(
    node: &Node,
    spec: Option<&NodeSpec>,
    port: &str,
    layout: &PortLayout,
) -> Option<Bounds> {
    let spec = spec?;
    let index = spec.inputs.iter().position(|p| p.name == port)?;
    if !spec.inputs[index].has_widget() {
        return None;
    }
    let offset = row_boundaries(&spec.inputs, layout)[index];
    let width = node_width(Some(spec), layout) - layout.widget_inset_left - layout.widget_inset_right;
    Some(Bounds::new(
        node.position.x + layout.widget_inset_left,
        node.position.y + offset,
        width.max(0.0),
        layout.widget_row_height,
    ))
}

/// Widget rectangles of every widget-bearing input, in row order.
pub fn widget_rects(node: &Node, spec: Option<&NodeSpec>, layout: &PortLayout) -> Vec<(String, Bounds)> {
    let Some(spec) = spec else {
        return Vec::new();
    };
    spec.inputs
        .iter()
        .filter(|p| p.has_widget())
        .filter_map(|p| widget_rect(node, Some(spec), &p.name, layout).map(|r| (p.name.clone(), r)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::NodeId;
    use crate::registry::{NodeCategory, WidgetKind};
    use pretty_assertions::assert_eq;

    fn mixed_spec() -> NodeSpec {
        NodeSpec::new("mixed", "Mixed", NodeCategory::Action, "box")
            .width(200.0)
            .input(PortSpec::plain("a", "any"))
            .input(PortSpec::widget("b", "string", WidgetKind::String))
            .input(PortSpec::plain("c", "any"))
            .output(PortSpec::plain("out", "any"))
    }

    fn at(x: f64, y: f64) -> Node {
        Node::new(NodeId::intern("ports-test"), "mixed", Point::new(x, y))
    }

    #[test]
    fn row_offsets_accumulate() {
        let spec = mixed_spec();
        let layout = PortLayout::default();
        assert_eq!(row_boundaries(&spec.inputs, &layout), vec![40.0, 64.0, 104.0, 128.0]);

        let node = at(0.0, 0.0);
        let ys: Vec<f64> = ["a", "b", "c"]
            .iter()
            .map(|p| resolve_port(&node, Some(&spec), p, PortDirection::Input, &layout).y)
            .collect();
        assert_eq!(ys, vec![40.0, 64.0, 104.0]);
    }

    #[test]
    fn inputs_left_outputs_right() {
        let spec = mixed_spec();
        let layout = PortLayout::default();
        let node = at(10.0, 20.0);
        let input = resolve_port(&node, Some(&spec), "a", PortDirection::Input, &layout);
        let output = resolve_port(&node, Some(&spec), "out", PortDirection::Output, &layout);
        assert_eq!(input, Point::new(10.0, 60.0));
        assert_eq!(output, Point::new(210.0, 60.0), "output column restarts at the header");
    }

    #[test]
    fn default_width_applies_without_spec_width() {
        let spec = NodeSpec::new("w", "W", NodeCategory::Logic, "x").output(PortSpec::plain("o", "any"));
        let layout = PortLayout::default();
        let p = resolve_port(&at(0.0, 0.0), Some(&spec), "o", PortDirection::Output, &layout);
        assert_eq!(p.x, 250.0);
    }

    #[test]
    fn unknown_type_or_port_falls_back_to_origin() {
        let spec = mixed_spec();
        let layout = PortLayout::default();
        let node = at(33.0, 44.0);
        assert_eq!(
            resolve_port(&node, None, "a", PortDirection::Input, &layout),
            Point::new(33.0, 44.0)
        );
        assert_eq!(
            resolve_port(&node, Some(&spec), "missing", PortDirection::Input, &layout),
            Point::new(33.0, 44.0)
        );
        // `out` is an output, not an input
        assert_eq!(
            resolve_port(&node, Some(&spec), "out", PortDirection::Input, &layout),
            Point::new(33.0, 44.0)
        );
    }

    #[test]
    fn node_size_uses_tallest_column_and_minimum() {
        let layout = PortLayout::default();
        let size = node_size(Some(&mixed_spec()), &layout);
        assert_eq!(size, Size::new(200.0, 136.0));

        let tiny = NodeSpec::new("t", "T", NodeCategory::Output, "x");
        assert_eq!(node_size(Some(&tiny), &layout), Size::new(250.0, 100.0));
        assert_eq!(node_size(None, &layout), Size::new(250.0, 100.0));
    }

    #[test]
    fn widget_rect_only_for_widget_rows() {
        let spec = mixed_spec();
        let layout = PortLayout::default();
        let node = at(100.0, 100.0);
        let rect = widget_rect(&node, Some(&spec), "b", &layout).unwrap();
        assert_eq!(rect, Bounds::new(116.0, 164.0, 176.0, 40.0));
        assert!(widget_rect(&node, Some(&spec), "a", &layout).is_none());
        assert_eq!(widget_rects(&node, Some(&spec), &layout).len(), 1);
    }

    #[test]
    fn anchors_cover_both_columns() {
        let spec = mixed_spec();
        let anchors = port_anchors(&at(0.0, 0.0), Some(&spec), &PortLayout::default());
        assert_eq!(anchors.len(), 4);
        assert_eq!(anchors[3].direction, PortDirection::Output);
        assert!(anchors[1].has_widget);
    }
}
