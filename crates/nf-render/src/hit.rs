//! Hit testing: canvas point → what is under it.
//!
//! Walks nodes front-to-back (last painted = topmost). Within a node an
//! embedded widget wins over a port handle, which wins over the node body.
//! Edge curves are only considered when no node claims the point.

use crate::edge_path::EdgePath;
use nf_core::id::{EdgeId, NodeId};
use nf_core::ports::{PortDirection, node_bounds, port_anchors, resolve_port, widget_rects};
use nf_core::{CanvasConfig, Node, NodeRegistry, Point, WorkflowGraph};

#[derive(Debug, Clone, PartialEq)]
pub enum HitTarget {
    /// Inside the widget embedded in an input row.
    Widget { node: NodeId, port: String },
    /// On a port handle.
    Port {
        node: NodeId,
        port: String,
        direction: PortDirection,
    },
    /// On a node body.
    Node(NodeId),
    /// Near an edge curve.
    Edge(EdgeId),
    /// Empty canvas.
    Canvas,
}

impl HitTarget {
    /// The node this hit belongs to, if any.
    pub fn node(&self) -> Option<NodeId> {
        match self {
            HitTarget::Widget { node, .. } | HitTarget::Port { node, .. } | HitTarget::Node(node) => {
                Some(*node)
            }
            HitTarget::Edge(_) | HitTarget::Canvas => None,
        }
    }
}

/// Find what lies under canvas point `p`.
pub fn hit_test(
    graph: &WorkflowGraph,
    registry: &dyn NodeRegistry,
    config: &CanvasConfig,
    p: Point,
) -> HitTarget {
    let nodes: Vec<&Node> = graph.nodes().collect();
    for node in nodes.into_iter().rev() {
        if let Some(hit) = hit_node(node, registry, config, p) {
            return hit;
        }
    }

    hit_edge(graph, registry, config, p).map_or(HitTarget::Canvas, HitTarget::Edge)
}

fn hit_node(
    node: &Node,
    registry: &dyn NodeRegistry,
    config: &CanvasConfig,
    p: Point,
) -> Option<HitTarget> {
    let spec = registry.spec(&node.node_type);
    let layout = &config.ports;

    if let Some((port, _)) = widget_rects(node, spec, layout)
        .into_iter()
        .find(|(_, rect)| rect.contains(p))
    {
        return Some(HitTarget::Widget { node: node.id, port });
    }

    if let Some(anchor) = port_anchors(node, spec, layout)
        .into_iter()
        .find(|a| a.point.distance(p) <= layout.handle_radius)
    {
        return Some(HitTarget::Port {
            node: node.id,
            port: anchor.name,
            direction: anchor.direction,
        });
    }

    node_bounds(node, spec, layout)
        .contains(p)
        .then_some(HitTarget::Node(node.id))
}

/// Nearest live edge within the configured tolerance.
fn hit_edge(
    graph: &WorkflowGraph,
    registry: &dyn NodeRegistry,
    config: &CanvasConfig,
    p: Point,
) -> Option<EdgeId> {
    let mut best: Option<(EdgeId, f64)> = None;
    for edge in graph.live_edges() {
        let (Some(src), Some(dst)) = (graph.node(edge.source), graph.node(edge.target)) else {
            continue;
        };
        let from = resolve_port(
            src,
            registry.spec(&src.node_type),
            &edge.source_handle,
            PortDirection::Output,
            &config.ports,
        );
        let to = resolve_port(
            dst,
            registry.spec(&dst.node_type),
            &edge.target_handle,
            PortDirection::Input,
            &config.ports,
        );
        let path = EdgePath::build(from, to, config.edge_min_control_offset);
        if !path.bounds().inflate(config.edge_hit_tolerance).contains(p) {
            continue;
        }
        let d = path.distance_to(p);
        if d <= config.edge_hit_tolerance && best.is_none_or(|(_, bd)| d < bd) {
            best = Some((edge.id, d));
        }
    }
    best.map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nf_core::{Connection, StaticRegistry};
    use pretty_assertions::assert_eq;

    fn two_nodes() -> (WorkflowGraph, StaticRegistry) {
        let mut g = WorkflowGraph::new();
        // action-log: inputs data (plain), prefix (widget); output data
        g.insert_node(Node::new(NodeId::intern("hit-a"), "action-log", Point::new(0.0, 0.0)))
            .unwrap();
        g.insert_node(Node::new(NodeId::intern("hit-b"), "action-log", Point::new(600.0, 0.0)))
            .unwrap();
        let edge = Connection::new(NodeId::intern("hit-a"), "data", NodeId::intern("hit-b"), "data")
            .into_edge(EdgeId::intern("hit-e"));
        g.push_edge(edge);
        (g, StaticRegistry::builtin())
    }

    #[test]
    fn body_port_widget_canvas() {
        let (g, reg) = two_nodes();
        let cfg = CanvasConfig::default();
        let a = NodeId::intern("hit-a");

        assert_eq!(hit_test(&g, &reg, &cfg, Point::new(120.0, 20.0)), HitTarget::Node(a));
        assert_eq!(
            hit_test(&g, &reg, &cfg, Point::new(250.0, 42.0)),
            HitTarget::Port {
                node: a,
                port: "data".into(),
                direction: PortDirection::Output
            }
        );
        assert_eq!(
            hit_test(&g, &reg, &cfg, Point::new(2.0, 40.0)),
            HitTarget::Port {
                node: a,
                port: "data".into(),
                direction: PortDirection::Input
            }
        );
        // prefix widget row spans y 64..104, x 16..242
        assert_eq!(
            hit_test(&g, &reg, &cfg, Point::new(100.0, 80.0)),
            HitTarget::Widget {
                node: a,
                port: "prefix".into()
            }
        );
        assert_eq!(hit_test(&g, &reg, &cfg, Point::new(400.0, 500.0)), HitTarget::Canvas);
    }

    #[test]
    fn topmost_node_wins() {
        let (mut g, reg) = two_nodes();
        let top = NodeId::intern("hit-top");
        g.insert_node(Node::new(top, "action-log", Point::new(100.0, 10.0)))
            .unwrap();
        let cfg = CanvasConfig::default();
        assert_eq!(hit_test(&g, &reg, &cfg, Point::new(150.0, 20.0)), HitTarget::Node(top));
    }

    #[test]
    fn edges_hit_within_tolerance_only() {
        let (g, reg) = two_nodes();
        let cfg = CanvasConfig::default();
        // edge runs straight from (250, 40) to (600, 40)
        assert_eq!(
            hit_test(&g, &reg, &cfg, Point::new(420.0, 43.0)),
            HitTarget::Edge(EdgeId::intern("hit-e"))
        );
        assert_eq!(hit_test(&g, &reg, &cfg, Point::new(420.0, 60.0)), HitTarget::Canvas);
    }

    #[test]
    fn dangling_edges_are_never_hit() {
        let (mut g, reg) = two_nodes();
        g.remove_node(NodeId::intern("hit-b"));
        let cfg = CanvasConfig::default();
        assert_eq!(hit_test(&g, &reg, &cfg, Point::new(420.0, 40.0)), HitTarget::Canvas);
    }

    #[test]
    fn unknown_type_is_a_plain_body() {
        let mut g = WorkflowGraph::new();
        let id = NodeId::intern("hit-mystery");
        g.insert_node(Node::new(id, "not-registered", Point::new(0.0, 0.0)))
            .unwrap();
        let cfg = CanvasConfig::default();
        let reg = StaticRegistry::builtin();
        assert_eq!(hit_test(&g, &reg, &cfg, Point::new(10.0, 10.0)), HitTarget::Node(id));
    }
}
