//! WASM bridge for NodeFlow: exposes the canvas engine to JavaScript.
//!
//! Compiled via `wasm-pack build --target web`. The UI shell owns the DOM
//! (palette, inspector, toasts, chat); everything that touches graph state,
//! geometry or the viewport goes through [`NodeCanvas`].

mod render2d;

use nf_core::id::NodeId;
use nf_core::{
    CanvasConfig, GraphPayload, MemoryStore, NodeRegistry, Point, Selection, Size,
    StaticRegistry, Workflow, WorkflowStore,
};
use nf_editor::{
    Canvas, Changes, Clock, GenerationOutcome, GenerationResponse, GenerationTicket, InputEvent,
    Modifiers, PointerButton, ToastQueue,
};
use serde::Serialize;
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use wasm_bindgen::prelude::*;
use web_sys::CanvasRenderingContext2d;

/// The main WASM-facing canvas controller.
///
/// Methods that report changes return either a bool ("redraw needed") or a
/// JSON string of the form
/// `{"graph":bool,"view":bool,"selection":bool,"overlay":bool,"focusWidget"?:{..},"quickAdd"?:{..}}`.
#[wasm_bindgen]
pub struct NodeCanvas {
    canvas: Canvas,
    registry: Arc<StaticRegistry>,
    toasts: Rc<RefCell<ToastQueue>>,
    store: MemoryStore,
    /// `false` = light (default), `true` = dark.
    dark_mode: bool,
}

#[wasm_bindgen]
impl NodeCanvas {
    /// Create a canvas with the built-in node types, default configuration
    /// and the starter graph.
    #[wasm_bindgen(constructor)]
    pub fn new(width: f64, height: f64) -> Self {
        Self::build(width, height, CanvasConfig::default())
    }

    /// Like the constructor, with a (possibly partial) JSON configuration.
    pub fn with_config(width: f64, height: f64, config_json: &str) -> Result<NodeCanvas, JsError> {
        let config = CanvasConfig::from_json(config_json)?;
        Ok(Self::build(width, height, config))
    }

    /// Render the current frame to a Canvas2D context.
    pub fn render(&self, ctx: &CanvasRenderingContext2d) {
        let theme = if self.dark_mode {
            render2d::CanvasTheme::dark()
        } else {
            render2d::CanvasTheme::light()
        };
        let size = self.canvas.size();
        render2d::render_frame(
            ctx,
            &self.canvas.frame(),
            self.canvas.graph(),
            size.width,
            size.height,
            &theme,
        );
    }

    pub fn set_theme(&mut self, is_dark: bool) {
        self.dark_mode = is_dark;
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.canvas.resize(Size::new(width, height));
    }

    /// Stop accepting generation results; call before dropping the canvas.
    pub fn teardown(&mut self) {
        self.canvas.teardown();
    }

    // ─── Pointer & keyboard ──────────────────────────────────────────────

    /// `button` is `MouseEvent.button`. Returns a changes JSON string.
    #[allow(clippy::too_many_arguments)]
    pub fn handle_pointer_down(
        &mut self,
        x: f64,
        y: f64,
        button: i16,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) -> String {
        let Some(button) = PointerButton::from_dom(button) else {
            return to_json(&Changes::default());
        };
        let modifiers = Modifiers {
            shift,
            ctrl,
            alt,
            meta,
        };
        let changes = self
            .canvas
            .handle_event(&InputEvent::pointer_down(x, y, button, modifiers));
        to_json(&changes)
    }

    /// Returns true if a redraw is needed.
    pub fn handle_pointer_move(&mut self, x: f64, y: f64) -> bool {
        self.canvas
            .handle_event(&InputEvent::pointer_move(x, y))
            .any()
    }

    /// Returns a changes JSON string.
    pub fn handle_pointer_up(&mut self, x: f64, y: f64) -> String {
        to_json(&self.canvas.handle_event(&InputEvent::pointer_up(x, y)))
    }

    pub fn handle_pointer_leave(&mut self) -> bool {
        self.canvas.handle_event(&InputEvent::PointerLeave).any()
    }

    /// Returns a changes JSON string; `quickAdd` is set on empty canvas.
    pub fn handle_double_click(&mut self, x: f64, y: f64) -> String {
        to_json(&self.canvas.handle_event(&InputEvent::DoubleClick { x, y }))
    }

    pub fn handle_wheel(&mut self, x: f64, y: f64, delta_y: f64) -> bool {
        self.canvas
            .handle_event(&InputEvent::Wheel { x, y, delta_y })
            .any()
    }

    /// Handle a keyboard event. Returns a changes JSON string.
    pub fn handle_key(&mut self, key: &str, ctrl: bool, shift: bool, alt: bool, meta: bool) -> String {
        let modifiers = Modifiers {
            shift,
            ctrl,
            alt,
            meta,
        };
        to_json(&self.canvas.handle_key(key, modifiers))
    }

    // ─── View ────────────────────────────────────────────────────────────

    /// `{"x":..,"y":..,"zoom":..,"percent":..}`
    pub fn get_viewport_json(&self) -> String {
        let vp = self.canvas.viewport();
        json!({
            "x": vp.x,
            "y": vp.y,
            "zoom": vp.zoom,
            "percent": vp.zoom_percent(),
        })
        .to_string()
    }

    pub fn set_viewport(&mut self, x: f64, y: f64, zoom: f64) {
        self.canvas.set_viewport(x, y, zoom);
    }

    pub fn zoom_in(&mut self) {
        self.canvas.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.canvas.zoom_out();
    }

    pub fn reset_view(&mut self) {
        self.canvas.reset_view();
    }

    /// Returns false when the canvas is empty.
    pub fn fit_view(&mut self) -> bool {
        self.canvas.fit_to_content()
    }

    /// Screen → canvas, as `{"x":..,"y":..}`. Used for drop targets.
    pub fn screen_to_canvas(&self, x: f64, y: f64) -> String {
        to_json(&self.canvas.viewport().screen_to_canvas(Point::new(x, y)))
    }

    // ─── Graph ───────────────────────────────────────────────────────────

    /// `{"nodes":[..],"edges":[..]}`
    pub fn get_graph_json(&self) -> String {
        let (nodes, edges) = self.canvas.graph().to_parts();
        to_json(&GraphPayload { nodes, edges })
    }

    /// Replace the whole graph. Returns false (graph untouched) on bad input.
    pub fn set_graph_json(&mut self, json: &str) -> bool {
        let result = GraphPayload::from_json(json)
            .and_then(|payload| self.canvas.replace_graph(payload.nodes, payload.edges));
        if let Err(err) = &result {
            log::warn!("set_graph_json rejected: {err}");
        }
        result.is_ok()
    }

    /// Place a node at a canvas position. Returns the new node id.
    pub fn add_node(&mut self, node_type: &str, x: f64, y: f64) -> String {
        self.canvas
            .add_node(node_type, Point::new(x, y))
            .id
            .as_str()
            .to_string()
    }

    /// Place a node in the middle of the visible area (palette click).
    pub fn add_node_at_center(&mut self, node_type: &str) -> String {
        self.canvas.add_node_at_center(node_type).id.as_str().to_string()
    }

    pub fn delete_selected(&mut self) -> bool {
        self.canvas.delete_selected()
    }

    /// Returns the id of the copy, or an empty string.
    pub fn duplicate_selected(&mut self) -> String {
        self.canvas
            .duplicate_selected()
            .map(|n| n.id.as_str().to_string())
            .unwrap_or_default()
    }

    pub fn clear_canvas(&mut self) {
        self.canvas.clear_canvas();
    }

    /// SVG path data of every drawn edge, for DOM overlays:
    /// `[{"id":..,"d":..,"selected":bool}]`.
    pub fn get_edge_paths_json(&self) -> String {
        let frame = self.canvas.frame();
        let paths: Vec<_> = frame
            .edges
            .iter()
            .map(|e| json!({ "id": e.id.as_str(), "d": e.path.to_svg(), "selected": e.selected }))
            .collect();
        serde_json::Value::Array(paths).to_string()
    }

    // ─── Selection & inspector ───────────────────────────────────────────

    /// `{"kind":"none"}`, `{"kind":"node","id":..}` or `{"kind":"edge","id":..}`.
    pub fn get_selection_json(&self) -> String {
        to_json(&self.canvas.selection())
    }

    pub fn select_node(&mut self, node_id: &str) -> bool {
        self.canvas.select(Selection::Node(NodeId::intern(node_id)))
    }

    pub fn clear_selection(&mut self) -> bool {
        self.canvas.select(Selection::None)
    }

    /// The selected node with its spec: `{"node":{..},"spec":{..}|null}`,
    /// or `null` when no node is selected.
    pub fn get_selected_node_json(&self) -> String {
        match self.canvas.selected_node() {
            Some(node) => json!({
                "node": node,
                "spec": self.registry.spec(&node.node_type),
            })
            .to_string(),
            None => "null".to_string(),
        }
    }

    /// Shallow-merge a JSON object into the selected node's data.
    pub fn patch_selected_data(&mut self, json: &str) -> bool {
        match serde_json::from_str::<serde_json::Value>(json) {
            Ok(serde_json::Value::Object(patch)) => self.canvas.patch_selected(patch),
            Ok(_) => {
                log::warn!("data patch must be a JSON object");
                false
            }
            Err(err) => {
                log::warn!("data patch is not JSON: {err}");
                false
            }
        }
    }

    // ─── Palette ─────────────────────────────────────────────────────────

    /// Node types matching `query`, grouped by category:
    /// `[{"category":"trigger","nodes":[spec, ..]}, ..]`.
    pub fn get_palette_json(&self, query: &str) -> String {
        let groups: Vec<_> = self
            .registry
            .grouped(query)
            .into_iter()
            .map(|(category, specs)| json!({ "category": category.as_str(), "nodes": specs }))
            .collect();
        serde_json::Value::Array(groups).to_string()
    }

    // ─── AI generation ───────────────────────────────────────────────────

    /// Start a generation. Returns `{"ticket":n,"request":{"prompt":..}}`;
    /// the shell sends the request and reports back with the ticket.
    pub fn begin_generation(&mut self, prompt: &str) -> String {
        let (ticket, request) = self.canvas.begin_generation(prompt);
        json!({ "ticket": ticket.0, "request": request }).to_string()
    }

    /// Deliver a service response (`{"workflowJson": ".."}`).
    /// Returns `"applied"`, `"failed"` or `"discarded"`.
    pub fn finish_generation(&mut self, ticket: f64, response_json: &str) -> String {
        let response = serde_json::from_str::<GenerationResponse>(response_json)
            .map_err(|e| format!("unexpected service response: {e}"));
        outcome_name(self.canvas.finish_generation(GenerationTicket(ticket as u64), response))
    }

    /// Report that the generation request itself failed.
    pub fn fail_generation(&mut self, ticket: f64, message: &str) -> String {
        outcome_name(
            self.canvas
                .finish_generation(GenerationTicket(ticket as u64), Err(message.to_string())),
        )
    }

    /// Request body for node suggestions: `{"currentWorkflow":..,"taskRequirements":..}`.
    pub fn suggestion_request_json(&self, task: &str) -> String {
        match self.canvas.suggestion_request(task) {
            Ok(request) => to_json(&request),
            Err(err) => {
                log::warn!("suggestion request not built: {err}");
                String::from("null")
            }
        }
    }

    /// Deliver a suggestion reply; returns the registered specs it names.
    pub fn accept_suggestions(&mut self, reply: &str) -> String {
        to_json(&self.canvas.accept_suggestions(Ok(reply.to_string())))
    }

    /// Report that the suggestion request itself failed.
    pub fn fail_suggestions(&mut self, message: &str) {
        self.canvas.accept_suggestions(Err(message.to_string()));
    }

    // ─── Notifications ───────────────────────────────────────────────────

    /// Drop expired toasts and return the rest, newest first.
    pub fn get_toasts_json(&mut self) -> String {
        let mut toasts = self.toasts.borrow_mut();
        toasts.expire();
        let visible: Vec<_> = toasts.visible().collect();
        to_json(&visible)
    }

    pub fn dismiss_toast(&mut self, id: f64) -> bool {
        self.toasts.borrow_mut().dismiss(id as u64)
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    /// Save the canvas as a workflow. Returns the stored record as JSON.
    pub fn save_workflow(&mut self, id: &str, name: &str, description: &str) -> String {
        let workflow = Workflow {
            description: description.to_string(),
            ..self.canvas.to_workflow(id, name)
        };
        to_json(&self.store.put(workflow))
    }

    /// Load a saved workflow onto the canvas.
    pub fn open_workflow(&mut self, id: &str) -> bool {
        let Some(record) = self.store.get(id) else {
            return false;
        };
        match self.canvas.load_workflow(&record.workflow) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("workflow {id} could not be opened: {err}");
                false
            }
        }
    }

    pub fn delete_workflow(&mut self, id: &str) -> bool {
        self.store.delete(id)
    }

    /// Saved workflows, most recently updated first; filtered when `query`
    /// is non-empty.
    pub fn list_workflows_json(&self, query: &str) -> String {
        let records = if query.trim().is_empty() {
            self.store.list()
        } else {
            self.store.search(query.trim())
        };
        to_json(&records)
    }

    /// Everything in the store as a pretty-printed export bundle.
    pub fn export_json(&self) -> Result<String, JsError> {
        Ok(self.store.export_all().to_json_pretty()?)
    }

    pub fn import_json(&mut self, json: &str) -> Result<(), JsError> {
        self.store.import_json(json)?;
        Ok(())
    }
}

impl NodeCanvas {
    fn build(width: f64, height: f64, config: CanvasConfig) -> Self {
        console_error_panic_hook_setup();

        let registry = Arc::new(StaticRegistry::builtin());
        let toasts = Rc::new(RefCell::new(ToastQueue::new(config.notifications, clock())));
        let mut canvas = Canvas::new(
            Arc::clone(&registry) as Arc<dyn NodeRegistry>,
            config,
            Box::new(Rc::clone(&toasts)),
        );
        canvas.resize(Size::new(width, height));
        canvas.load_starter();

        Self {
            canvas,
            registry,
            toasts,
            store: MemoryStore::new(),
            dark_mode: false,
        }
    }
}

fn outcome_name(outcome: GenerationOutcome) -> String {
    match outcome {
        GenerationOutcome::Applied { .. } => "applied",
        GenerationOutcome::Failed => "failed",
        GenerationOutcome::Discarded(_) => "discarded",
    }
    .to_string()
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|err| {
        log::warn!("serialization failed: {err}");
        "null".to_string()
    })
}

// ─── Clock ───────────────────────────────────────────────────────────────

/// Millisecond clock backed by `Date.now()`.
#[cfg(target_arch = "wasm32")]
struct DateClock;

#[cfg(target_arch = "wasm32")]
impl Clock for DateClock {
    fn now_ms(&self) -> u64 {
        js_sys::Date::now() as u64
    }
}

#[cfg(target_arch = "wasm32")]
fn clock() -> impl Clock {
    DateClock
}

#[cfg(not(target_arch = "wasm32"))]
fn clock() -> impl Clock {
    nf_editor::SystemClock::default()
}

// ─── Panic hook for WASM debugging ───────────────────────────────────────

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("NodeFlow WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

// ─── Standalone helpers (no canvas needed) ───────────────────────────────

/// Check a `{nodes, edges}` document. Returns JSON: `{"ok":true,"nodes":n,"edges":n}`
/// or `{"ok":false,"error":"..."}`.
#[wasm_bindgen]
pub fn validate_graph(json: &str) -> String {
    match GraphPayload::from_json(json).and_then(GraphPayload::into_graph) {
        Ok(graph) => json!({
            "ok": true,
            "nodes": graph.node_count(),
            "edges": graph.edges.len(),
        })
        .to_string(),
        Err(err) => json!({ "ok": false, "error": err.to_string() }).to_string(),
    }
}
