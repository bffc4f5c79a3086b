//! End-to-end canvas behaviour: real hit testing, gestures, generation.
//!
//! Starter graph geometry (default layout):
//! - `1` trigger-http at (50, 150), 250 × 100; outputs `body` (300, 190),
//!   `headers` (300, 214)
//! - `3` action-function at (350, 280), 300 × 112; input `input` (350, 320)
//! - `2` action-log at (650, 150); input `data` (650, 190)
//! - edge `e1-2`: 1.body → 2.data, a straight curve along y = 190

use nf_core::id::{EdgeId, NodeId};
use nf_core::{CanvasConfig, Point, Selection, Size, StaticRegistry};
use nf_editor::{
    Canvas, Discard, GenerationOutcome, GenerationResponse, InputEvent, Modifiers, PointerButton,
    Session, ToastQueue, ManualClock, Variant,
};
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

const GENERATED: &str = include_str!("fixtures/generated_reply.md");

fn canvas() -> (Canvas, Rc<RefCell<ToastQueue>>) {
    let config = CanvasConfig::default();
    let toasts = Rc::new(RefCell::new(ToastQueue::new(
        config.notifications,
        ManualClock::default(),
    )));
    let mut canvas = Canvas::new(
        Arc::new(StaticRegistry::builtin()),
        config,
        Box::new(Rc::clone(&toasts)),
    );
    canvas.resize(Size::new(1000.0, 800.0));
    canvas.load_starter();
    (canvas, toasts)
}

fn down(x: f64, y: f64) -> InputEvent {
    InputEvent::pointer_down(x, y, PointerButton::Primary, Modifiers::NONE)
}

fn id(s: &str) -> NodeId {
    NodeId::intern(s)
}

#[test]
fn drag_moves_node_by_pointer_delta() {
    let (mut c, _) = canvas();
    let changes = c.handle_event(&down(70.0, 160.0));
    assert!(changes.selection);
    assert_eq!(c.selection(), Selection::Node(id("1")));

    let changes = c.handle_event(&InputEvent::pointer_move(120.0, 200.0));
    assert!(changes.graph);
    assert_eq!(c.graph().node(id("1")).unwrap().position, Point::new(100.0, 190.0));

    c.handle_event(&InputEvent::pointer_up(120.0, 200.0));
    assert_eq!(*c.interaction().session(), Session::Idle);

    // further moves do nothing
    assert!(!c.handle_event(&InputEvent::pointer_move(500.0, 500.0)).any());
}

#[test]
fn drag_after_zoom_keeps_grab_point() {
    let (mut c, _) = canvas();
    c.set_viewport(-40.0, 20.0, 2.0);
    // canvas (70, 160) → screen (100, 340)
    c.handle_event(&down(100.0, 340.0));
    c.handle_event(&InputEvent::pointer_move(200.0, 420.0));
    // moved 50 × 40 canvas units
    assert_eq!(c.graph().node(id("1")).unwrap().position, Point::new(100.0, 190.0));
}

#[test]
fn connecting_output_to_input_adds_edge() {
    let (mut c, _) = canvas();
    let before = c.graph().live_edges().count();

    c.handle_event(&down(300.0, 214.0));
    assert!(matches!(c.interaction().session(), Session::Connecting { .. }));

    c.handle_event(&InputEvent::pointer_move(500.0, 300.0));
    assert!(c.frame().live.is_some());

    let changes = c.handle_event(&InputEvent::pointer_up(351.0, 321.0));
    assert!(changes.graph);
    assert_eq!(c.graph().live_edges().count(), before + 1);
    let added = c.graph().live_edges().last().unwrap();
    assert_eq!(
        (added.source, added.source_handle.as_str(), added.target, added.target_handle.as_str()),
        (id("1"), "headers", id("3"), "input")
    );
    assert!(c.frame().live.is_none());
}

#[test]
fn connection_dropped_on_empty_canvas_is_discarded() {
    let (mut c, _) = canvas();
    let revision = c.revision();
    c.handle_event(&down(300.0, 214.0));
    let changes = c.handle_event(&InputEvent::pointer_up(200.0, 600.0));
    assert!(!changes.graph);
    assert_eq!(c.revision(), revision);
}

#[test]
fn clicking_edge_selects_it_and_delete_removes_it() {
    let (mut c, _) = canvas();
    c.handle_event(&down(475.0, 191.0));
    assert_eq!(c.selection(), Selection::Edge(EdgeId::intern("e1-2")));
    assert!(c.frame().edges.iter().any(|e| e.selected));

    c.handle_event(&InputEvent::pointer_up(475.0, 191.0));
    let changes = c.handle_event(&InputEvent::Key {
        key: "Delete".into(),
        modifiers: Modifiers::NONE,
    });
    assert!(changes.graph);
    assert_eq!(c.graph().live_edges().count(), 0);
    assert_eq!(c.selection(), Selection::None);
}

#[test]
fn widget_click_focuses_instead_of_dragging() {
    let (mut c, _) = canvas();
    // `path` widget of node 1 spans (66, 190) .. (292, 230)
    let changes = c.handle_event(&down(100.0, 200.0));
    let focus = changes.focus_widget.expect("widget focus requested");
    assert_eq!((focus.node, focus.port.as_str()), (id("1"), "path"));
    assert_eq!(*c.interaction().session(), Session::Idle);
}

#[test]
fn deleting_node_leaves_dangling_edge_hidden() {
    let (mut c, _) = canvas();
    c.select(Selection::Node(id("2")));
    assert!(c.delete_selected());
    assert_eq!(c.graph().edges.len(), 1);
    assert!(c.frame().edges.is_empty());
}

#[test]
fn wheel_zoom_keeps_point_under_cursor() {
    let (mut c, _) = canvas();
    let cursor = Point::new(400.0, 300.0);
    let before = c.viewport().screen_to_canvas(cursor);
    let changes = c.handle_event(&InputEvent::Wheel {
        x: cursor.x,
        y: cursor.y,
        delta_y: -120.0,
    });
    assert!(changes.view);
    let after = c.viewport().screen_to_canvas(cursor);
    assert!((before.x - after.x).abs() < 1e-9 && (before.y - after.y).abs() < 1e-9);
    assert_eq!(c.viewport().zoom_percent(), 110);
}

#[test]
fn double_click_then_quick_add() {
    let (mut c, _) = canvas();
    let changes = c.handle_event(&InputEvent::DoubleClick { x: 500.0, y: 600.0 });
    let request = changes.quick_add.expect("quick add requested");
    let node = c.add_node("logic-if", request.canvas);
    assert_eq!(node.position, Point::new(500.0, 600.0));
    assert_eq!(c.selection(), Selection::Node(node.id));
}

#[test]
fn fit_shows_every_node() {
    let (mut c, _) = canvas();
    c.set_viewport(900.0, -300.0, 3.0);
    assert!(c.fit_to_content());
    let zoom = c.viewport().zoom;
    assert!(zoom > 0.1 && zoom <= 1.0);
    let size = c.size();
    for node in c.frame().nodes {
        let screen = c.viewport().bounds_to_screen(&node.bounds);
        assert!(screen.x >= 0.0 && screen.y >= 0.0, "{:?}", node.id);
        assert!(screen.right() <= size.width && screen.bottom() <= size.height);
    }
}

#[test]
fn generation_replaces_graph_atomically() {
    let (mut c, toasts) = canvas();
    let before = c.snapshot();

    // a drag is in progress when the result lands
    c.handle_event(&down(70.0, 160.0));
    let (ticket, request) = c.begin_generation("log large orders");
    assert_eq!(request.prompt, "log large orders");

    let outcome = c.finish_generation(
        ticket,
        Ok(GenerationResponse {
            workflow_json: GENERATED.to_string(),
        }),
    );
    assert_eq!(outcome, GenerationOutcome::Applied { nodes: 4, edges: 3 });
    assert_eq!(*c.interaction().session(), Session::Idle);
    assert_eq!(c.selection(), Selection::None);
    assert!(c.graph().node(id("check")).is_some());
    assert!(c.graph().node(id("1")).is_none());

    // a reader holding the old snapshot still sees the whole old graph
    assert_eq!(before.node_count(), 3);
    assert_eq!(before.live_edges().count(), 1);

    let toasts = toasts.borrow();
    assert_eq!(toasts.visible().next().unwrap().notification.variant, Variant::Success);
}

#[test]
fn stale_generations_are_discarded() {
    let (mut c, toasts) = canvas();
    let (first, _) = c.begin_generation("one");
    let (second, _) = c.begin_generation("two");
    let reply = || {
        Ok(GenerationResponse {
            workflow_json: GENERATED.to_string(),
        })
    };

    assert_eq!(
        c.finish_generation(first, reply()),
        GenerationOutcome::Discarded(Discard::Superseded)
    );
    assert_eq!(c.graph().node_count(), 3);

    c.teardown();
    assert_eq!(
        c.finish_generation(second, reply()),
        GenerationOutcome::Discarded(Discard::TornDown)
    );
    assert_eq!(c.graph().node_count(), 3);
    assert!(toasts.borrow().is_empty());
}

#[test]
fn failed_generation_keeps_graph_and_notifies() {
    let (mut c, toasts) = canvas();
    let revision = c.revision();

    let (ticket, _) = c.begin_generation("broken");
    let outcome = c.finish_generation(
        ticket,
        Ok(GenerationResponse {
            workflow_json: r#"{"nodes": [}"#.to_string(),
        }),
    );
    assert_eq!(outcome, GenerationOutcome::Failed);

    let (ticket, _) = c.begin_generation("offline");
    let outcome = c.finish_generation(ticket, Err("quota exceeded".into()));
    assert_eq!(outcome, GenerationOutcome::Failed);

    assert_eq!(c.revision(), revision);
    let toasts = toasts.borrow();
    let titles: Vec<(&str, Variant)> = toasts
        .visible()
        .map(|t| (t.notification.title.as_str(), t.notification.variant))
        .collect();
    assert_eq!(
        titles,
        vec![("Generation failed", Variant::Error), ("Generation failed", Variant::Error)]
    );
    let latest = toasts.visible().next().unwrap();
    assert!(latest.notification.description.as_deref().unwrap().contains("quota exceeded"));
}

#[test]
fn inspector_patch_merges_shallowly() {
    let (mut c, _) = canvas();
    c.select(Selection::Node(id("3")));
    let mut patch = serde_json::Map::new();
    patch.insert("timeout".into(), serde_json::json!(30));
    assert!(c.patch_selected(patch));
    let data = &c.selected_node().unwrap().data;
    assert!(data.contains_key("code"));
    assert_eq!(data["timeout"], 30);
}

#[test]
fn workflow_round_trip_through_canvas() {
    let (c, _) = canvas();
    let workflow = c.to_workflow("wf-1", "Starter");
    let (mut other, _) = canvas();
    other.clear_canvas();
    other.load_workflow(&workflow).unwrap();
    assert_eq!(other.graph().node_count(), 3);
    assert_eq!(other.to_workflow("wf-1", "Starter"), workflow);
}

#[test]
fn inverted_zoom_limits_do_not_break_zooming() {
    let mut config = CanvasConfig::default();
    config.zoom.min = 5.0;
    let mut c = Canvas::new(
        Arc::new(StaticRegistry::builtin()),
        config,
        Box::new(nf_editor::NullNotifier),
    );
    c.handle_event(&InputEvent::Wheel {
        x: 400.0,
        y: 300.0,
        delta_y: -1.0,
    });
    c.zoom_out();
    c.set_viewport(0.0, 0.0, 0.5);
    assert_eq!(c.viewport().zoom, 4.0);
}

#[test]
fn suggestions_keep_registered_nodes_and_notify() {
    let (mut c, toasts) = canvas();
    let request = c.suggestion_request("email the API result").unwrap();
    assert!(request.current_workflow.contains("trigger-http"));

    let specs = c.accept_suggestions(Ok(
        r#"{"suggestedNodes": ["trigger-http", "action-email", "crystal-ball"]}"#.to_string(),
    ));
    let types: Vec<&str> = specs.iter().map(|s| s.node_type.as_str()).collect();
    assert_eq!(types, vec!["trigger-http", "action-email"]);

    assert!(c.accept_suggestions(Err("offline".into())).is_empty());
    let toasts = toasts.borrow();
    let titles: Vec<(&str, Variant)> = toasts
        .visible()
        .map(|t| (t.notification.title.as_str(), t.notification.variant))
        .collect();
    assert_eq!(
        titles,
        vec![("Suggestion failed", Variant::Error), ("AI suggestions", Variant::Default)]
    );
}
