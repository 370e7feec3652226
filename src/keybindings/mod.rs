//! Keyboard shortcuts.
//!
//! Global tab switching and catalog actions, plus editor shortcuts. All
//! of it sits behind the default-on `keyboard-nav` feature.

pub mod actions;
pub mod bindings;

use gpui::App;

pub use actions::editor;
pub use actions::global;
pub use bindings::register_keybindings;

/// Initialize the keybindings system. Call once during startup, after
/// the window is opened.
pub fn init(cx: &mut App) {
    register_keybindings(cx);
}
