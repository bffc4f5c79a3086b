//! Pointer interaction state machine.
//!
//! Translates normalized input events into viewport changes and
//! [`Effect`]s (graph mutations, selection changes, UI requests). At most
//! one gesture is active at a time:
//!
//! | State | Left by |
//! |-------|---------|
//! | `Idle` | middle press or Shift+left on empty canvas → `Panning`; left press on a node body → `DraggingNode`; press on an output port → `Connecting` |
//! | `Panning` | release or pointer leave |
//! | `DraggingNode` | release or pointer leave |
//! | `Connecting` | release (on an input port: commit the edge) or pointer leave |
//!
//! Wheel zoom is legal in every state. Presses that arrive while a gesture
//! is still active are ignored.

use crate::input::{InputEvent, PointerButton};
use crate::mutation::GraphMutation;
use nf_core::id::NodeId;
use nf_core::ports::PortDirection;
use nf_core::{CanvasConfig, Connection, Point, Selection, Viewport, WorkflowGraph};
use nf_render::{HitTarget, LiveConnection};

#[derive(Debug, Clone, PartialEq)]
pub enum Session {
    Idle,
    Panning {
        /// Screen position at the previous pan step.
        last: Point,
    },
    DraggingNode {
        node: NodeId,
        /// Canvas-space offset from the node origin to the grab point.
        grab_offset: Point,
    },
    Connecting {
        source: NodeId,
        port: String,
        /// Canvas-space pointer position.
        pointer: Point,
    },
}

/// Something the host has to act on after an event.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Mutate(GraphMutation),
    Select(Selection),
    /// Keyboard focus should move to the widget of `port` on `node`.
    FocusWidget { node: NodeId, port: String },
    /// Open the quick-add palette; new nodes go to `canvas`.
    QuickAdd { canvas: Point, screen: Point },
    /// Pan or zoom changed.
    ViewChanged,
    /// Only transient overlay state changed (live connection).
    Redraw,
}

#[derive(Debug, Clone)]
pub struct InteractionMachine {
    session: Session,
}

impl Default for InteractionMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionMachine {
    pub fn new() -> Self {
        Self {
            session: Session::Idle,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.session, Session::Idle)
    }

    /// The connection being dragged, for drawing.
    pub fn live_connection(&self) -> Option<LiveConnection> {
        match &self.session {
            Session::Connecting {
                source,
                port,
                pointer,
            } => Some(LiveConnection {
                source: *source,
                port: port.clone(),
                pointer: *pointer,
            }),
            _ => None,
        }
    }

    /// Abandon any gesture without side effects.
    pub fn cancel(&mut self) -> bool {
        let was_active = !self.is_idle();
        if was_active {
            log::debug!("session cancelled: {:?}", self.session);
        }
        self.session = Session::Idle;
        was_active
    }

    fn enter(&mut self, next: Session) {
        log::debug!("session {:?} → {:?}", self.session, next);
        self.session = next;
    }

    /// Feed one event.
    ///
    /// `hit` must describe what lies under the event position; it is only
    /// consulted for presses, releases and double-clicks.
    pub fn handle(
        &mut self,
        event: &InputEvent,
        hit: &HitTarget,
        viewport: &mut Viewport,
        graph: &WorkflowGraph,
        config: &CanvasConfig,
    ) -> Vec<Effect> {
        match event {
            InputEvent::PointerDown {
                x,
                y,
                button,
                modifiers,
            } => {
                if !self.is_idle() {
                    log::trace!("press ignored while {:?}", self.session);
                    return vec![];
                }
                let screen = Point::new(*x, *y);
                match button {
                    PointerButton::Middle => {
                        self.enter(Session::Panning { last: screen });
                        vec![]
                    }
                    PointerButton::Primary if modifiers.shift && *hit == HitTarget::Canvas => {
                        self.enter(Session::Panning { last: screen });
                        vec![]
                    }
                    PointerButton::Primary => self.press(screen, hit, viewport, graph),
                    PointerButton::Secondary => vec![],
                }
            }

            InputEvent::PointerMove { x, y } => {
                let screen = Point::new(*x, *y);
                match &mut self.session {
                    Session::Idle => vec![],
                    Session::Panning { last } => {
                        viewport.pan_by(screen - *last);
                        *last = screen;
                        vec![Effect::ViewChanged]
                    }
                    Session::DraggingNode { node, grab_offset } => {
                        let position = viewport.screen_to_canvas(screen) - *grab_offset;
                        vec![Effect::Mutate(GraphMutation::MoveNode {
                            id: *node,
                            position,
                        })]
                    }
                    Session::Connecting { pointer, .. } => {
                        *pointer = viewport.screen_to_canvas(screen);
                        vec![Effect::Redraw]
                    }
                }
            }

            InputEvent::PointerUp { .. } => {
                let previous = std::mem::replace(&mut self.session, Session::Idle);
                match previous {
                    Session::Connecting { source, port, .. } => {
                        let mut effects = Vec::with_capacity(2);
                        if let HitTarget::Port {
                            node,
                            port: target_port,
                            direction: PortDirection::Input,
                        } = hit
                        {
                            log::debug!("connect {source}.{port} → {node}.{target_port}");
                            effects.push(Effect::Mutate(GraphMutation::AddEdge(Connection::new(
                                source,
                                port,
                                *node,
                                target_port.clone(),
                            ))));
                        } else {
                            log::debug!("connection from {source}.{port} dropped");
                        }
                        effects.push(Effect::Redraw);
                        effects
                    }
                    Session::Idle => vec![],
                    other => {
                        log::debug!("session {other:?} → Idle");
                        vec![]
                    }
                }
            }

            InputEvent::PointerLeave => {
                let was_connecting = matches!(self.session, Session::Connecting { .. });
                self.cancel();
                if was_connecting {
                    vec![Effect::Redraw]
                } else {
                    vec![]
                }
            }

            InputEvent::DoubleClick { x, y } => {
                if self.is_idle() && *hit == HitTarget::Canvas {
                    let screen = Point::new(*x, *y);
                    vec![Effect::QuickAdd {
                        canvas: viewport.screen_to_canvas(screen),
                        screen,
                    }]
                } else {
                    vec![]
                }
            }

            InputEvent::Wheel { x, y, delta_y } => {
                let factor = if *delta_y > 0.0 {
                    config.wheel_zoom_out
                } else {
                    config.wheel_zoom_in
                };
                viewport.zoom_at(Point::new(*x, *y), factor);
                vec![Effect::ViewChanged]
            }

            InputEvent::Key { .. } => vec![],
        }
    }

    /// Idle left press without Shift.
    fn press(
        &mut self,
        screen: Point,
        hit: &HitTarget,
        viewport: &Viewport,
        graph: &WorkflowGraph,
    ) -> Vec<Effect> {
        let canvas = viewport.screen_to_canvas(screen);
        match hit {
            HitTarget::Widget { node, port } => vec![
                Effect::Select(Selection::Node(*node)),
                Effect::FocusWidget {
                    node: *node,
                    port: port.clone(),
                },
            ],
            HitTarget::Port {
                node,
                port,
                direction: PortDirection::Output,
            } => {
                self.enter(Session::Connecting {
                    source: *node,
                    port: port.clone(),
                    pointer: canvas,
                });
                vec![Effect::Redraw]
            }
            HitTarget::Port {
                direction: PortDirection::Input,
                ..
            } => vec![],
            HitTarget::Node(id) => {
                let Some(node) = graph.node(*id) else {
                    return vec![];
                };
                self.enter(Session::DraggingNode {
                    node: *id,
                    grab_offset: canvas - node.position,
                });
                vec![Effect::Select(Selection::Node(*id))]
            }
            HitTarget::Edge(id) => vec![Effect::Select(Selection::Edge(*id))],
            HitTarget::Canvas => vec![Effect::Select(Selection::None)],
        }
    }
}
