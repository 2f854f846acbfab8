//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `EditorAction`s, which the editor
//! runs through `Editor::perform`.

/// Toolbar-level actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorAction {
    // ── Structure ──
    AddNode,
    DeleteActiveNode,
    DeleteActiveRelationship,
    ReverseActiveRelationship,

    // ── Layout ──
    ForceLayout,
    /// Grow the internal scale (snapping reaches less far).
    ZoomIn,
    ZoomOut,

    // ── Gesture ──
    /// Abandon the current drag.
    Cancel,
}

/// Resolves key events into editor actions.
///
/// On macOS `meta` is ⌘; on other platforms `ctrl` serves the same role.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"n"`, `"Delete"`).
    /// Returns `None` if the key combo has no binding.
    pub fn resolve(
        key: &str,
        ctrl: bool,
        shift: bool,
        _alt: bool,
        meta: bool,
    ) -> Option<EditorAction> {
        let cmd = ctrl || meta;

        if cmd {
            return match key {
                "=" | "+" => Some(EditorAction::ZoomIn),
                "-" => Some(EditorAction::ZoomOut),
                _ => None,
            };
        }

        if shift {
            return match key {
                "Delete" | "Backspace" => Some(EditorAction::DeleteActiveRelationship),
                _ => None,
            };
        }

        match key {
            "n" | "N" => Some(EditorAction::AddNode),
            "Delete" | "Backspace" => Some(EditorAction::DeleteActiveNode),
            "r" | "R" => Some(EditorAction::ReverseActiveRelationship),
            "f" | "F" => Some(EditorAction::ForceLayout),
            "Escape" => Some(EditorAction::Cancel),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_structure_keys() {
        assert_eq!(
            ShortcutMap::resolve("n", false, false, false, false),
            Some(EditorAction::AddNode)
        );
        assert_eq!(
            ShortcutMap::resolve("Delete", false, false, false, false),
            Some(EditorAction::DeleteActiveNode)
        );
        assert_eq!(
            ShortcutMap::resolve("Backspace", false, false, false, false),
            Some(EditorAction::DeleteActiveNode)
        );
        assert_eq!(
            ShortcutMap::resolve("R", false, false, false, false),
            Some(EditorAction::ReverseActiveRelationship)
        );
    }

    #[test]
    fn resolve_shift_delete_removes_relationship() {
        assert_eq!(
            ShortcutMap::resolve("Delete", false, true, false, false),
            Some(EditorAction::DeleteActiveRelationship)
        );
    }

    #[test]
    fn resolve_layout_and_cancel() {
        assert_eq!(
            ShortcutMap::resolve("f", false, false, false, false),
            Some(EditorAction::ForceLayout)
        );
        assert_eq!(
            ShortcutMap::resolve("Escape", false, false, false, false),
            Some(EditorAction::Cancel)
        );
    }

    #[test]
    fn resolve_zoom_needs_cmd() {
        assert_eq!(
            ShortcutMap::resolve("=", false, false, false, true),
            Some(EditorAction::ZoomIn)
        );
        assert_eq!(
            ShortcutMap::resolve("-", true, false, false, false),
            Some(EditorAction::ZoomOut)
        );
        assert_eq!(ShortcutMap::resolve("=", false, false, false, false), None);
    }

    #[test]
    fn resolve_unknown_key() {
        assert_eq!(ShortcutMap::resolve("q", false, false, false, false), None);
        assert_eq!(ShortcutMap::resolve("n", true, false, false, false), None);
    }
}
