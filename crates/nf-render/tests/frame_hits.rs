//! Frame building and hit testing against the built-in registry.
//!
//! - `a` trigger-http at (0, 0): outputs `body` (250, 40), `headers` (250, 64)
//! - `b` action-log at (400, 0): input `data` (400, 40)
//! - `c` action-log at (100, 20), added last so it sits above `a`

use nf_core::id::{EdgeId, NodeId};
use nf_core::{CanvasConfig, Edge, Node, Point, Selection, StaticRegistry, Viewport, WorkflowGraph};
use nf_render::{HitTarget, build_frame, hit_test};
use pretty_assertions::assert_eq;

fn id(s: &str) -> NodeId {
    NodeId::intern(s)
}

fn edge(name: &str, source: &str, source_handle: &str, target: &str, target_handle: &str) -> Edge {
    Edge {
        id: EdgeId::intern(name),
        source: id(source),
        source_handle: source_handle.into(),
        target: id(target),
        target_handle: target_handle.into(),
    }
}

fn graph() -> WorkflowGraph {
    let mut g = WorkflowGraph::new();
    g.insert_node(Node::new(id("a"), "trigger-http", Point::new(0.0, 0.0))).unwrap();
    g.insert_node(Node::new(id("b"), "action-log", Point::new(400.0, 0.0))).unwrap();
    g.insert_node(Node::new(id("c"), "action-log", Point::new(100.0, 20.0))).unwrap();
    g.push_edge(edge("ab", "a", "body", "b", "data"));
    g.push_edge(edge("gone", "a", "headers", "missing", "data"));
    g
}

#[test]
fn later_node_wins_where_nodes_overlap() {
    let (g, r, config) = (graph(), StaticRegistry::builtin(), CanvasConfig::default());
    assert_eq!(hit_test(&g, &r, &config, Point::new(200.0, 30.0)), HitTarget::Node(id("c")));
    assert_eq!(hit_test(&g, &r, &config, Point::new(50.0, 10.0)), HitTarget::Node(id("a")));
}

#[test]
fn node_added_after_delete_is_topmost() {
    let (mut g, r, config) = (graph(), StaticRegistry::builtin(), CanvasConfig::default());
    g.remove_node(id("a"));
    g.insert_node(Node::new(id("d"), "action-log", Point::new(150.0, 0.0))).unwrap();
    // inside both `c` (100, 20) and `d` (150, 0) headers
    assert_eq!(hit_test(&g, &r, &config, Point::new(200.0, 30.0)), HitTarget::Node(id("d")));
}

#[test]
fn edges_hit_within_tolerance_only() {
    let (g, r, config) = (graph(), StaticRegistry::builtin(), CanvasConfig::default());
    assert_eq!(
        hit_test(&g, &r, &config, Point::new(380.0, 44.0)),
        HitTarget::Edge(EdgeId::intern("ab"))
    );
    assert_eq!(hit_test(&g, &r, &config, Point::new(380.0, 60.0)), HitTarget::Canvas);
}

#[test]
fn port_handle_beats_node_body() {
    let (g, r, config) = (graph(), StaticRegistry::builtin(), CanvasConfig::default());
    let hit = hit_test(&g, &r, &config, Point::new(400.0, 42.0));
    assert!(
        matches!(&hit, HitTarget::Port { node, port, .. } if *node == id("b") && port == "data"),
        "{hit:?}"
    );
}

#[test]
fn frame_drops_dangling_edges_and_marks_selection() {
    let (g, r, config) = (graph(), StaticRegistry::builtin(), CanvasConfig::default());
    let frame = build_frame(&g, &r, &config, &Viewport::default(), Selection::Node(id("b")), None);

    let ids: Vec<NodeId> = frame.nodes.iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![id("a"), id("b"), id("c")]);
    assert_eq!(frame.edges.len(), 1);
    assert_eq!(frame.edges[0].id, EdgeId::intern("ab"));
    assert!(frame.node(id("b")).unwrap().selected);
    assert!(!frame.node(id("a")).unwrap().selected);
}

#[test]
fn unknown_type_renders_with_raw_label() {
    let mut g = WorkflowGraph::new();
    g.insert_node(Node::new(id("x"), "custom-thing", Point::new(10.0, 10.0))).unwrap();
    let frame = build_frame(
        &g,
        &StaticRegistry::builtin(),
        &CanvasConfig::default(),
        &Viewport::default(),
        Selection::None,
        None,
    );
    let node = frame.node(id("x")).unwrap();
    assert_eq!(node.label, "custom-thing");
    assert_eq!(node.category, None);
    assert!(node.ports.is_empty());
}

#[test]
fn frame_transform_follows_viewport() {
    let mut viewport = Viewport::default();
    viewport.x = -40.0;
    viewport.y = 20.0;
    viewport.zoom = 2.0;
    let frame = build_frame(
        &graph(),
        &StaticRegistry::builtin(),
        &CanvasConfig::default(),
        &viewport,
        Selection::None,
        None,
    );
    assert_eq!(frame.transform.as_coeffs(), [2.0, 0.0, 0.0, 2.0, -40.0, 20.0]);
    assert_eq!(frame.zoom, 2.0);
}
