//! User-visible notifications.
//!
//! The canvas reports outcomes (generation failures, a cleared canvas, …)
//! through an injected [`Notifier`]. [`ToastQueue`] is the stock
//! implementation: a bounded, newest-first list whose entries expire after
//! their duration, measured with an injected [`Clock`].

use nf_core::NotificationConfig;
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    #[default]
    Default,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub variant: Variant,
    /// Requested display time; `None` uses the configured default.
    #[serde(skip)]
    pub duration_ms: Option<u64>,
}

impl Notification {
    pub fn new(variant: Variant, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            variant,
            ..Self::default()
        }
    }

    pub fn info(title: impl Into<String>) -> Self {
        Self::new(Variant::Default, title)
    }

    pub fn success(title: impl Into<String>) -> Self {
        Self::new(Variant::Success, title)
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self::new(Variant::Error, title)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_duration(mut self, ms: u64) -> Self {
        self.duration_ms = Some(ms);
        self
    }
}

/// Sink for user-visible notifications.
pub trait Notifier {
    fn notify(&mut self, notification: Notification);
}

/// Lets a host keep a handle on the notifier it gave to the canvas.
impl<N: Notifier> Notifier for Rc<RefCell<N>> {
    fn notify(&mut self, notification: Notification) {
        self.borrow_mut().notify(notification);
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&mut self, notification: Notification) {
        log::debug!("notification dropped: {}", notification.title);
    }
}

// ─── Clocks ──────────────────────────────────────────────────────────────

/// Monotonic millisecond time source.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Wall-clock-free monotonic time since construction.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: std::time::Instant,
}

#[cfg(not(target_arch = "wasm32"))]
impl Default for SystemClock {
    fn default() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock(Rc<Cell<u64>>);

impl ManualClock {
    pub fn advance(&self, ms: u64) {
        self.0.set(self.0.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.0.get()
    }
}

// ─── Toast queue ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Toast {
    pub id: u64,
    #[serde(flatten)]
    pub notification: Notification,
    pub created_at_ms: u64,
    pub duration_ms: u64,
}

impl Toast {
    pub fn expires_at_ms(&self) -> u64 {
        self.created_at_ms + self.duration_ms
    }
}

pub struct ToastQueue {
    items: VecDeque<Toast>,
    config: NotificationConfig,
    clock: Box<dyn Clock>,
    next_id: u64,
}

impl ToastQueue {
    pub fn new(config: NotificationConfig, clock: impl Clock + 'static) -> Self {
        Self {
            items: VecDeque::with_capacity(config.capacity),
            config,
            clock: Box::new(clock),
            next_id: 1,
        }
    }

    /// Add a notification at the front, evicting the oldest past capacity.
    pub fn push(&mut self, notification: Notification) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        let duration_ms = notification
            .duration_ms
            .unwrap_or(self.config.default_duration_ms)
            .max(self.config.min_duration_ms);
        self.items.push_front(Toast {
            id,
            notification,
            created_at_ms: self.clock.now_ms(),
            duration_ms,
        });
        self.items.truncate(self.config.capacity);
        id
    }

    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.items.len();
        self.items.retain(|t| t.id != id);
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Drop every toast whose time is up. Returns how many were removed.
    pub fn expire(&mut self) -> usize {
        let now = self.clock.now_ms();
        let before = self.items.len();
        self.items.retain(|t| t.expires_at_ms() > now);
        before - self.items.len()
    }

    /// Current toasts, newest first.
    pub fn visible(&self) -> impl Iterator<Item = &Toast> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Notifier for ToastQueue {
    fn notify(&mut self, notification: Notification) {
        self.push(notification);
    }
}
