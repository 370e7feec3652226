//! Default keybinding definitions.

use gpui::{App, KeyBinding};

use super::actions::editor::*;
use super::actions::global::*;

/// Register all default keybindings with the application.
pub fn register_keybindings(cx: &mut App) {
    cx.bind_keys(global_bindings());
    cx.bind_keys(editor_bindings());
}

/// Global keybindings that work in any context.
fn global_bindings() -> Vec<KeyBinding> {
    vec![
        // Tab switching
        KeyBinding::new("cmd-1", SwitchToTester, None),
        KeyBinding::new("cmd-2", SwitchToQueryTemplates, None),
        KeyBinding::new("cmd-3", SwitchToSchemaTemplates, None),
        // Catalog actions
        KeyBinding::new("cmd-n", NewDatabase, None),
        KeyBinding::new("cmd-r", RefreshAll, None),
        // Escape
        KeyBinding::new("escape", Escape, None),
    ]
}

/// Editor-specific keybindings.
fn editor_bindings() -> Vec<KeyBinding> {
    vec![
        KeyBinding::new("cmd-enter", ExecuteQuery, Some("Editor")),
        KeyBinding::new("cmd-shift-f", FormatQuery, Some("Editor")),
        KeyBinding::new("cmd-s", SaveQuery, Some("Editor")),
        KeyBinding::new("cmd-o", LoadQuery, Some("Editor")),
    ]
}
