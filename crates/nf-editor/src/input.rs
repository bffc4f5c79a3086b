//! Input abstraction layer.
//!
//! Normalizes browser or native pointer, wheel and keyboard events into a
//! unified `InputEvent` consumed by the interaction machine. All positions
//! are in screen space (pixels relative to the canvas element).

use nf_core::Point;

/// Which pointer button changed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

impl PointerButton {
    /// Map a DOM `MouseEvent.button` value.
    pub fn from_dom(button: i16) -> Option<Self> {
        match button {
            0 => Some(Self::Primary),
            1 => Some(Self::Middle),
            2 => Some(Self::Secondary),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ..Modifiers::NONE
    };

    /// ⌘ on macOS, Ctrl elsewhere.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// A normalized input event.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown {
        x: f64,
        y: f64,
        button: PointerButton,
        modifiers: Modifiers,
    },

    PointerMove { x: f64, y: f64 },

    PointerUp { x: f64, y: f64 },

    /// Pointer left the canvas element.
    PointerLeave,

    DoubleClick { x: f64, y: f64 },

    /// Wheel / trackpad scroll at a screen position.
    Wheel { x: f64, y: f64, delta_y: f64 },

    Key { key: String, modifiers: Modifiers },
}

impl InputEvent {
    pub fn pointer_down(x: f64, y: f64, button: PointerButton, modifiers: Modifiers) -> Self {
        Self::PointerDown {
            x,
            y,
            button,
            modifiers,
        }
    }

    pub fn pointer_move(x: f64, y: f64) -> Self {
        Self::PointerMove { x, y }
    }

    pub fn pointer_up(x: f64, y: f64) -> Self {
        Self::PointerUp { x, y }
    }

    /// Screen position, if this is a positional event.
    pub fn position(&self) -> Option<Point> {
        match self {
            Self::PointerDown { x, y, .. }
            | Self::PointerMove { x, y }
            | Self::PointerUp { x, y }
            | Self::DoubleClick { x, y }
            | Self::Wheel { x, y, .. } => Some(Point::new(*x, *y)),
            Self::PointerLeave | Self::Key { .. } => None,
        }
    }
}
