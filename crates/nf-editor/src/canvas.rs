//! Canvas controller.
//!
//! `Canvas` owns one editing surface: the graph store, the viewport, the
//! interaction machine and the current selection. Hosts feed it input
//! events and read back a [`Changes`] summary plus a [`Frame`] to draw.

use crate::generation::{
    Discard, GenerationError, GenerationGate, GenerationRequest, GenerationResponse,
    GenerationTicket, SuggestionRequest, SuggestionResponse, filter_suggestions, parse_response,
};
use crate::input::{InputEvent, Modifiers};
use crate::interaction::{Effect, InteractionMachine};
use crate::mutation::{GraphMutation, GraphStore, MutationError};
use crate::notify::{Notification, Notifier};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use nf_core::id::NodeId;
use nf_core::ports::node_bounds;
use nf_core::{
    Bounds, CanvasConfig, Connection, DocumentError, Edge, Node, NodeData, NodeRegistry, NodeSpec,
    Point, Selection, Size, Viewport, Workflow, WorkflowGraph,
};
use nf_render::{Frame, HitTarget, build_frame, hit_test};
use serde::Serialize;
use std::sync::Arc;

/// A widget that should receive keyboard focus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WidgetFocus {
    pub node: NodeId,
    pub port: String,
}

/// Where the quick-add palette was requested.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuickAddRequest {
    /// Where a picked node will be placed.
    pub canvas: Point,
    /// Where to open the palette.
    pub screen: Point,
}

/// What an event changed. The host redraws when `any()` is true.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Changes {
    pub graph: bool,
    pub view: bool,
    pub selection: bool,
    /// Transient overlay only (live connection).
    pub overlay: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus_widget: Option<WidgetFocus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quick_add: Option<QuickAddRequest>,
}

impl Changes {
    pub fn any(&self) -> bool {
        self.graph || self.view || self.selection || self.overlay
    }

    /// Fold several event results together.
    pub fn combine(items: impl IntoIterator<Item = Changes>) -> Changes {
        let mut all = Changes::default();
        for item in items {
            all.merge(item);
        }
        all
    }

    fn merge(&mut self, other: Changes) {
        self.graph |= other.graph;
        self.view |= other.view;
        self.selection |= other.selection;
        self.overlay |= other.overlay;
        if other.focus_widget.is_some() {
            self.focus_widget = other.focus_widget;
        }
        if other.quick_add.is_some() {
            self.quick_add = other.quick_add;
        }
    }
}

/// How a finished generation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// The generated graph replaced the canvas contents.
    Applied { nodes: usize, edges: usize },
    /// The response was unusable; the user was notified and the graph kept.
    Failed,
    /// The response arrived too late to matter.
    Discarded(Discard),
}

pub struct Canvas {
    store: GraphStore,
    viewport: Viewport,
    machine: InteractionMachine,
    selection: Selection,
    registry: Arc<dyn NodeRegistry>,
    config: CanvasConfig,
    notifier: Box<dyn Notifier>,
    gate: GenerationGate,
    size: Size,
}

impl Canvas {
    pub fn new(
        registry: Arc<dyn NodeRegistry>,
        config: CanvasConfig,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        Self {
            store: GraphStore::new(config.edges, config.duplicate_offset),
            viewport: Viewport::new(config.zoom),
            machine: InteractionMachine::new(),
            selection: Selection::None,
            registry,
            config,
            notifier,
            gate: GenerationGate::default(),
            size: Size::new(800.0, 600.0),
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn graph(&self) -> &WorkflowGraph {
        self.store.graph()
    }

    pub fn snapshot(&self) -> Arc<WorkflowGraph> {
        self.store.snapshot()
    }

    pub fn revision(&self) -> u64 {
        self.store.revision()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn set_viewport(&mut self, x: f64, y: f64, zoom: f64) {
        self.viewport.x = x;
        self.viewport.y = y;
        self.viewport.zoom = self.config.zoom.clamp(zoom);
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn registry(&self) -> &dyn NodeRegistry {
        self.registry.as_ref()
    }

    pub fn interaction(&self) -> &InteractionMachine {
        &self.machine
    }

    /// On-screen size of the canvas element.
    pub fn size(&self) -> Size {
        self.size
    }

    pub fn resize(&mut self, size: Size) {
        self.size = size;
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Select a node or edge. Ids that no longer exist select nothing.
    pub fn select(&mut self, selection: Selection) -> bool {
        let selection = match selection {
            Selection::Node(id) if !self.graph().contains_node(id) => Selection::None,
            Selection::Edge(id) if self.graph().edge(id).is_none() => Selection::None,
            other => other,
        };
        let changed = self.selection != selection;
        self.selection = selection;
        changed
    }

    /// The node the inspector is showing.
    pub fn selected_node(&self) -> Option<&Node> {
        self.graph().node(self.selection.node()?)
    }

    // ─── Drawing ─────────────────────────────────────────────────────────

    /// Drawables for the current state.
    pub fn frame(&self) -> Frame {
        let live = self.machine.live_connection();
        build_frame(
            self.graph(),
            self.registry.as_ref(),
            &self.config,
            &self.viewport,
            self.selection,
            live.as_ref(),
        )
    }

    /// What lies under a screen position.
    pub fn hit_at(&self, screen: Point) -> HitTarget {
        hit_test(
            self.graph(),
            self.registry.as_ref(),
            &self.config,
            self.viewport.screen_to_canvas(screen),
        )
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Feed one input event.
    pub fn handle_event(&mut self, event: &InputEvent) -> Changes {
        if let InputEvent::Key { key, modifiers } = event {
            return self.handle_key(key, *modifiers);
        }

        let hit = match event {
            InputEvent::PointerDown { x, y, .. }
            | InputEvent::PointerUp { x, y }
            | InputEvent::DoubleClick { x, y } => self.hit_at(Point::new(*x, *y)),
            _ => HitTarget::Canvas,
        };

        let effects = self.machine.handle(
            event,
            &hit,
            &mut self.viewport,
            self.store.graph(),
            &self.config,
        );
        self.apply_effects(effects)
    }

    fn apply_effects(&mut self, effects: Vec<Effect>) -> Changes {
        let mut changes = Changes::default();
        for effect in effects {
            match effect {
                Effect::Mutate(mutation) => match self.store.apply(mutation) {
                    Ok(changed) => changes.graph |= changed,
                    Err(err) => self.report_rejection(&err),
                },
                Effect::Select(selection) => changes.selection |= self.select(selection),
                Effect::FocusWidget { node, port } => {
                    changes.focus_widget = Some(WidgetFocus { node, port });
                }
                Effect::QuickAdd { canvas, screen } => {
                    changes.quick_add = Some(QuickAddRequest { canvas, screen });
                }
                Effect::ViewChanged => changes.view = true,
                Effect::Redraw => changes.overlay = true,
            }
        }
        changes
    }

    fn report_rejection(&mut self, err: &MutationError) {
        log::warn!("mutation rejected: {err}");
        if matches!(
            err,
            MutationError::SelfLoop(_) | MutationError::DuplicateEdge { .. }
        ) {
            self.notifier
                .notify(Notification::error("Connection not allowed").with_description(err.to_string()));
        }
    }

    /// Resolve and run a keyboard shortcut.
    pub fn handle_key(&mut self, key: &str, modifiers: Modifiers) -> Changes {
        let Some(action) = ShortcutMap::resolve(key, modifiers) else {
            return Changes::default();
        };
        log::debug!("shortcut {key:?} → {action:?}");
        let mut changes = Changes::default();
        match action {
            ShortcutAction::Delete => {
                changes.graph = self.delete_selected();
                changes.selection = changes.graph;
            }
            ShortcutAction::Duplicate => {
                let duplicated = self.duplicate_selected().is_some();
                changes.graph = duplicated;
                changes.selection = duplicated;
            }
            ShortcutAction::ClearCanvas => {
                self.clear_canvas();
                changes.graph = true;
                changes.selection = true;
                changes.overlay = true;
            }
            ShortcutAction::ZoomIn => {
                self.zoom_in();
                changes.view = true;
            }
            ShortcutAction::ZoomOut => {
                self.zoom_out();
                changes.view = true;
            }
            ShortcutAction::ZoomToFit => changes.view = self.fit_to_content(),
            ShortcutAction::ResetView => {
                self.reset_view();
                changes.view = true;
            }
            ShortcutAction::Cancel => {
                if self.machine.cancel() {
                    changes.overlay = true;
                } else {
                    changes.selection = self.select(Selection::None);
                }
            }
            ShortcutAction::Deselect => changes.selection = self.select(Selection::None),
        }
        changes
    }

    /// Abandon the active gesture, if any.
    pub fn cancel(&mut self) -> bool {
        self.machine.cancel()
    }

    // ─── View ────────────────────────────────────────────────────────────

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_by(self.config.step_zoom_in, self.size);
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_by(self.config.step_zoom_out, self.size);
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset();
    }

    /// Frame every node. Returns false when there is nothing to frame.
    pub fn fit_to_content(&mut self) -> bool {
        let layout = &self.config.ports;
        let bounds: Vec<Bounds> = self
            .store
            .graph()
            .nodes()
            .map(|n| node_bounds(n, self.registry.spec(&n.node_type), layout))
            .collect();
        self.viewport
            .fit_to_content(&bounds, self.size, self.config.fit_padding)
    }

    // ─── Editing ─────────────────────────────────────────────────────────

    /// Add a node at a canvas position and select it.
    pub fn add_node(&mut self, node_type: &str, position: Point) -> Node {
        if self.registry.spec(node_type).is_none() {
            log::warn!("adding node of unregistered type {node_type:?}");
        }
        let node = self.store.add_node(node_type, position);
        self.selection = Selection::Node(node.id);
        node
    }

    /// Add a node centred in the visible area (palette click).
    pub fn add_node_at_center(&mut self, node_type: &str) -> Node {
        let spec = self.registry.spec(node_type);
        let size = nf_core::ports::node_size(spec, &self.config.ports);
        let center = self.viewport.visible_canvas_rect(self.size).center();
        let position = Point::new(center.x - size.width / 2.0, center.y - size.height / 2.0);
        self.add_node(node_type, position)
    }

    pub fn move_node(&mut self, id: NodeId, position: Point) -> bool {
        self.store.move_node(id, position)
    }

    /// Shallow-merge inspector edits into a node's data.
    pub fn patch_node_data(&mut self, id: NodeId, patch: NodeData) -> bool {
        self.store.patch_node_data(id, patch)
    }

    pub fn patch_selected(&mut self, patch: NodeData) -> bool {
        match self.selection.node() {
            Some(id) => self.store.patch_node_data(id, patch),
            None => false,
        }
    }

    pub fn connect(&mut self, conn: Connection) -> Result<Edge, MutationError> {
        self.store.add_edge(conn)
    }

    /// Run a mutation built elsewhere.
    pub fn apply(&mut self, mutation: GraphMutation) -> Result<bool, MutationError> {
        let changed = self.store.apply(mutation)?;
        self.prune_selection();
        Ok(changed)
    }

    /// Remove the selected node or edge.
    pub fn delete_selected(&mut self) -> bool {
        let removed = match self.selection {
            Selection::Node(id) => self.store.remove_node(id).is_some(),
            Selection::Edge(id) => self.store.remove_edge(id).is_some(),
            Selection::None => false,
        };
        if removed {
            self.selection = Selection::None;
        }
        removed
    }

    /// Duplicate the selected node and select the copy.
    pub fn duplicate_selected(&mut self) -> Option<Node> {
        let copy = self.store.duplicate_node(self.selection.node()?)?;
        self.selection = Selection::Node(copy.id);
        Some(copy)
    }

    /// Remove everything and tell the user.
    pub fn clear_canvas(&mut self) {
        self.machine.cancel();
        self.store.clear();
        self.selection = Selection::None;
        self.notifier.notify(
            Notification::info("Canvas cleared").with_description("Ready for a fresh start!"),
        );
    }

    fn prune_selection(&mut self) {
        let current = self.selection;
        self.select(current);
    }

    /// Swap the whole graph, cancelling any gesture and clearing selection.
    fn swap_graph(&mut self, graph: WorkflowGraph) {
        self.machine.cancel();
        self.selection = Selection::None;
        self.store.replace_with(graph);
    }

    // ─── Documents ───────────────────────────────────────────────────────

    pub fn replace_graph(&mut self, nodes: Vec<Node>, edges: Vec<Edge>) -> Result<(), DocumentError> {
        let graph = WorkflowGraph::from_parts(nodes, edges)?;
        self.swap_graph(graph);
        Ok(())
    }

    pub fn load_workflow(&mut self, workflow: &Workflow) -> Result<(), DocumentError> {
        let graph = workflow.to_graph()?;
        self.swap_graph(graph);
        Ok(())
    }

    /// Open the starter graph.
    pub fn load_starter(&mut self) {
        self.swap_graph(starter_graph());
    }

    pub fn to_workflow(&self, id: &str, name: &str) -> Workflow {
        Workflow::from_graph(id, name, self.graph())
    }

    // ─── AI generation ───────────────────────────────────────────────────

    /// Start a generation request. Any earlier ticket becomes stale.
    pub fn begin_generation(&mut self, prompt: &str) -> (GenerationTicket, GenerationRequest) {
        let ticket = self.gate.begin();
        log::debug!("generation {} started", ticket.0);
        (
            ticket,
            GenerationRequest {
                prompt: prompt.to_string(),
            },
        )
    }

    /// Deliver the service's answer for `ticket`.
    ///
    /// `Err` carries the service's own failure message.
    pub fn finish_generation(
        &mut self,
        ticket: GenerationTicket,
        result: Result<GenerationResponse, String>,
    ) -> GenerationOutcome {
        if let Err(discard) = self.gate.check(ticket) {
            log::warn!("generation {} discarded: {discard:?}", ticket.0);
            return GenerationOutcome::Discarded(discard);
        }

        let parsed = result
            .map_err(GenerationError::Service)
            .and_then(|response| parse_response(&response));

        match parsed {
            Ok(graph) => {
                let nodes = graph.node_count();
                let edges = graph.edges.len();
                self.swap_graph(graph);
                self.notifier.notify(
                    Notification::success("Workflow generated")
                        .with_description("A new workflow was created from your prompt."),
                );
                GenerationOutcome::Applied { nodes, edges }
            }
            Err(err) => {
                log::warn!("generation {} failed: {err}", ticket.0);
                self.notifier.notify(
                    Notification::error("Generation failed").with_description(err.to_string()),
                );
                GenerationOutcome::Failed
            }
        }
    }

    /// Request body for node suggestions against the current graph.
    pub fn suggestion_request(&self, task: &str) -> Result<SuggestionRequest, serde_json::Error> {
        SuggestionRequest::for_graph(self.graph(), task)
    }

    /// Turn a suggestion reply into registered node specs and tell the
    /// user about them. `Err` carries the service's own failure message.
    pub fn accept_suggestions(&mut self, reply: Result<String, String>) -> Vec<NodeSpec> {
        let parsed = reply
            .map_err(GenerationError::Service)
            .and_then(|text| SuggestionResponse::from_reply(&text));
        match parsed {
            Ok(response) => {
                let specs: Vec<NodeSpec> = filter_suggestions(&response, self.registry.as_ref())
                    .into_iter()
                    .cloned()
                    .collect();
                let labels: Vec<&str> = specs.iter().map(|s| s.label.as_str()).collect();
                let description = if labels.is_empty() {
                    "No matching nodes were found.".to_string()
                } else {
                    format!("Consider adding: {}", labels.join(", "))
                };
                self.notifier
                    .notify(Notification::info("AI suggestions").with_description(description));
                specs
            }
            Err(err) => {
                log::warn!("node suggestions failed: {err}");
                self.notifier.notify(
                    Notification::error("Suggestion failed")
                        .with_description("AI suggestions could not be fetched right now."),
                );
                Vec::new()
            }
        }
    }

    /// The canvas is going away; late generation results are ignored.
    pub fn teardown(&mut self) {
        self.machine.cancel();
        self.gate.tear_down();
    }
}

/// The graph a fresh editor opens with: an HTTP trigger logging its body,
/// plus an unconnected function node.
pub fn starter_graph() -> WorkflowGraph {
    let mut graph = WorkflowGraph::new();
    let mut code = NodeData::new();
    code.insert(
        "code".into(),
        serde_json::Value::String("return {\n  \"message\": \"Hello from code!\"\n};".into()),
    );
    let nodes = [
        Node::new(NodeId::intern("1"), "trigger-http", Point::new(50.0, 150.0)),
        Node {
            data: code,
            ..Node::new(NodeId::intern("3"), "action-function", Point::new(350.0, 280.0))
        },
        Node::new(NodeId::intern("2"), "action-log", Point::new(650.0, 150.0)),
    ];
    for node in nodes {
        if let Err(err) = graph.insert_node(node) {
            log::warn!("starter graph: {err}");
        }
    }
    graph.push_edge(
        Connection::new(NodeId::intern("1"), "body", NodeId::intern("2"), "data")
            .into_edge(nf_core::EdgeId::intern("e1-2")),
    );
    graph
}
