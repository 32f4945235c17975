//! Keyboard shortcut mapping for history actions.
//!
//! Platform-aware: on macOS `meta` is ⌘, elsewhere `ctrl` serves the same
//! role. The bindings follow the usual editor conventions — ⌘Z undo,
//! ⇧⌘Z redo, and ⌘Y as the Windows-style redo alias.

/// History actions reachable from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryAction {
    Undo,
    Redo,
}

/// Resolves key events into history actions.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"z"`).
    /// Returns `None` if the combo has no binding.
    pub fn resolve(key: &str, ctrl: bool, shift: bool, meta: bool) -> Option<HistoryAction> {
        let cmd = ctrl || meta;
        if !cmd {
            return None;
        }

        if shift {
            return match key {
                "z" | "Z" => Some(HistoryAction::Redo),
                _ => None,
            };
        }

        match key {
            "z" | "Z" => Some(HistoryAction::Undo),
            "y" | "Y" => Some(HistoryAction::Redo),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_undo_redo() {
        // Cmd+Z → Undo
        assert_eq!(
            ShortcutMap::resolve("z", false, false, true),
            Some(HistoryAction::Undo)
        );
        // Ctrl+Z → Undo
        assert_eq!(
            ShortcutMap::resolve("z", true, false, false),
            Some(HistoryAction::Undo)
        );
        // Cmd+Shift+Z → Redo
        assert_eq!(
            ShortcutMap::resolve("z", false, true, true),
            Some(HistoryAction::Redo)
        );
        // Ctrl+Y → Redo
        assert_eq!(
            ShortcutMap::resolve("y", true, false, false),
            Some(HistoryAction::Redo)
        );
    }

    #[test]
    fn bare_keys_do_nothing() {
        assert_eq!(ShortcutMap::resolve("z", false, false, false), None);
        assert_eq!(ShortcutMap::resolve("y", false, true, false), None);
    }

    #[test]
    fn unknown_combos_do_nothing() {
        assert_eq!(ShortcutMap::resolve("q", true, false, false), None);
        assert_eq!(ShortcutMap::resolve("y", true, true, false), None);
    }
}
