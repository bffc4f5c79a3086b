//! Frame building: graph + viewport → drawable primitives.
//!
//! A `Frame` is backend-agnostic: everything is in canvas space plus one
//! canvas→screen transform. The Vello painter and the Canvas2D bridge both
//! consume it.

use crate::edge_path::EdgePath;
use kurbo::Affine;
use nf_core::id::{EdgeId, NodeId};
use nf_core::ports::{PortAnchor, PortDirection, node_bounds, port_anchors, resolve_port, widget_rects};
use nf_core::{
    Bounds, CanvasConfig, GridSpec, NodeCategory, NodeRegistry, Point, Selection, Viewport,
    WorkflowGraph,
};

/// In-progress connection drag, drawn from the source port to the pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveConnection {
    pub source: NodeId,
    pub port: String,
    /// Canvas-space pointer position.
    pub pointer: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeBox {
    pub id: NodeId,
    pub node_type: String,
    /// Spec label, or the raw type for unregistered types.
    pub label: String,
    pub category: Option<NodeCategory>,
    pub icon: String,
    pub bounds: Bounds,
    pub ports: Vec<PortAnchor>,
    pub widgets: Vec<(String, Bounds)>,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeCurve {
    pub id: EdgeId,
    pub path: EdgePath,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Canvas → screen.
    pub transform: Affine,
    pub grid: GridSpec,
    pub zoom: f64,
    /// Back to front.
    pub nodes: Vec<NodeBox>,
    pub edges: Vec<EdgeCurve>,
    pub live: Option<EdgePath>,
}

impl Frame {
    pub fn node(&self, id: NodeId) -> Option<&NodeBox> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// Canvas → screen transform for a viewport.
pub fn viewport_transform(viewport: &Viewport) -> Affine {
    Affine::translate((viewport.x, viewport.y)) * Affine::scale(viewport.zoom)
}

/// Recompute every drawable for the current graph and view state.
pub fn build_frame(
    graph: &WorkflowGraph,
    registry: &dyn NodeRegistry,
    config: &CanvasConfig,
    viewport: &Viewport,
    selection: Selection,
    live: Option<&LiveConnection>,
) -> Frame {
    let layout = &config.ports;

    let nodes: Vec<NodeBox> = graph
        .nodes()
        .map(|node| {
            let spec = registry.spec(&node.node_type);
            NodeBox {
                id: node.id,
                node_type: node.node_type.clone(),
                label: spec.map_or_else(|| node.node_type.clone(), |s| s.label.clone()),
                category: spec.map(|s| s.category),
                icon: spec.map(|s| s.icon.clone()).unwrap_or_default(),
                bounds: node_bounds(node, spec, layout),
                ports: port_anchors(node, spec, layout),
                widgets: widget_rects(node, spec, layout),
                selected: selection.node() == Some(node.id),
            }
        })
        .collect();

    let edges: Vec<EdgeCurve> = graph
        .live_edges()
        .filter_map(|edge| {
            let src = graph.node(edge.source)?;
            let dst = graph.node(edge.target)?;
            let from = resolve_port(
                src,
                registry.spec(&src.node_type),
                &edge.source_handle,
                PortDirection::Output,
                layout,
            );
            let to = resolve_port(
                dst,
                registry.spec(&dst.node_type),
                &edge.target_handle,
                PortDirection::Input,
                layout,
            );
            Some(EdgeCurve {
                id: edge.id,
                path: EdgePath::build(from, to, config.edge_min_control_offset),
                selected: selection.edge() == Some(edge.id),
            })
        })
        .collect();

    let live = live.and_then(|conn| {
        let src = graph.node(conn.source)?;
        let from = resolve_port(
            src,
            registry.spec(&src.node_type),
            &conn.port,
            PortDirection::Output,
            layout,
        );
        Some(EdgePath::build(from, conn.pointer, config.edge_min_control_offset))
    });

    log::trace!(
        "frame: {} node(s), {} edge(s), live={}",
        nodes.len(),
        edges.len(),
        live.is_some()
    );

    Frame {
        transform: viewport_transform(viewport),
        grid: viewport.grid(config.grid_spacing),
        zoom: viewport.zoom,
        nodes,
        edges,
        live,
    }
}
