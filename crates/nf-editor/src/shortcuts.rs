//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s. The map lives
//! in Rust so the browser bridge and native hosts resolve keys the same way.

use crate::input::Modifiers;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ── Edit ──
    /// Remove the selected node or edge.
    Delete,
    Duplicate,
    /// Remove every node and edge (⌘Delete).
    ClearCanvas,

    // ── View ──
    ZoomIn,
    ZoomOut,
    ZoomToFit,
    ResetView,

    // ── UI ──
    /// Abort the active gesture, or clear the selection when idle.
    Cancel,
    Deselect,
}

/// Resolves key events into shortcut actions.
///
/// On macOS `meta` is ⌘, elsewhere `ctrl` plays the same role.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"d"`, `"Delete"`).
    /// Returns `None` if the key combo has no binding.
    pub fn resolve(key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        let cmd = modifiers.command();

        if cmd && modifiers.shift {
            return match key {
                "a" | "A" => Some(ShortcutAction::Deselect),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "d" | "D" => Some(ShortcutAction::Duplicate),
                "=" | "+" => Some(ShortcutAction::ZoomIn),
                "-" => Some(ShortcutAction::ZoomOut),
                "0" => Some(ShortcutAction::ResetView),
                "1" => Some(ShortcutAction::ZoomToFit),
                "Delete" | "Backspace" => Some(ShortcutAction::ClearCanvas),
                _ => None,
            };
        }

        if modifiers.shift {
            return match key {
                "!" | "1" => Some(ShortcutAction::ZoomToFit),
                _ => None,
            };
        }

        match key {
            "Delete" | "Backspace" => Some(ShortcutAction::Delete),
            "Escape" => Some(ShortcutAction::Cancel),
            "+" | "=" => Some(ShortcutAction::ZoomIn),
            "-" => Some(ShortcutAction::ZoomOut),
            "f" | "F" => Some(ShortcutAction::ZoomToFit),
            _ => None,
        }
    }
}
