//! SQL editor panel: input, Run/Format, and scratch-file Save/Load.

use chrono::Local;
use gpui::*;
use gpui_component::{
    ActiveTheme as _, Sizable as _, StyledExt as _,
    button::{Button, ButtonVariants as _},
    h_flex,
    input::{Input as TextInput, InputState},
    label::Label,
    v_flex,
};
use sqlformat::{FormatOptions, QueryParams};

#[cfg(feature = "keyboard-nav")]
use crate::keybindings::editor as editor_actions;
use crate::state::SessionState;

pub enum EditorEvent {
    ExecuteQuery(String),
}

impl EventEmitter<EditorEvent> for Editor {}

pub struct Editor {
    input: Entity<InputState>,
}

impl Editor {
    pub fn view(window: &mut Window, cx: &mut App) -> Entity<Self> {
        cx.new(|cx| Self::new(window, cx))
    }

    fn new(window: &mut Window, cx: &mut Context<Self>) -> Self {
        let input = cx.new(|cx| {
            InputState::new(window, cx)
                .multi_line(true)
                .placeholder("SELECT ...")
        });

        Self { input }
    }

    /// Replace the editor content (template loading, file loading).
    pub fn set_text(&mut self, text: String, window: &mut Window, cx: &mut Context<Self>) {
        self.input.update(cx, |input, cx| {
            input.set_value(text, window, cx);
        });
    }

    fn current_text(&self, cx: &Context<Self>) -> String {
        self.input.read(cx).value().to_string()
    }

    fn run(&mut self, cx: &mut Context<Self>) {
        let sql = self.current_text(cx);
        if sql.trim().is_empty() {
            return;
        }
        cx.emit(EditorEvent::ExecuteQuery(sql));
    }

    fn format(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        let sql = self.current_text(cx);
        if sql.trim().is_empty() {
            return;
        }
        let formatted = sqlformat::format(&sql, &QueryParams::None, &FormatOptions::default());
        self.set_text(formatted, window, cx);
        SessionState::set_status(cx, "Formatted.");
    }

    /// Save the editor content to a timestamped file in the catalog
    /// directory (native dialogs are out of scope).
    fn save(&mut self, cx: &mut Context<Self>) {
        let sql = self.current_text(cx);
        if sql.trim().is_empty() {
            SessionState::set_status(cx, "Nothing to save.");
            return;
        }

        let Some(dir) = cx.global::<SessionState>().database_dir.clone() else {
            SessionState::set_status(cx, "No database directory configured yet.");
            return;
        };

        let file_name = format!("query_{}.sql", Local::now().format("%Y%m%d_%H%M%S"));
        let path = dir.join(file_name);

        cx.spawn(async move |_this: WeakEntity<Editor>, cx| {
            let outcome = async_fs::write(&path, sql.as_bytes()).await;
            let _ = cx.update(|cx| match outcome {
                Ok(()) => SessionState::set_status(cx, format!("Saved to {}.", path.display())),
                Err(e) => SessionState::set_status(cx, format!("Save failed: {e}")),
            });
        })
        .detach();
    }

    /// Load the most recently saved `.sql` file from the catalog
    /// directory back into the editor.
    fn load(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        let Some(dir) = cx.global::<SessionState>().database_dir.clone() else {
            SessionState::set_status(cx, "No database directory configured yet.");
            return;
        };

        cx.spawn_in(window, async move |this, cx| {
            let Some(path) = newest_sql_file(&dir) else {
                let _ = cx.update(|_window, cx| {
                    SessionState::set_status(cx, "No saved .sql files found.");
                });
                return;
            };

            match async_fs::read_to_string(&path).await {
                Ok(text) => {
                    let _ = this.update_in(cx, |this, window, cx| {
                        this.set_text(text, window, cx);
                        SessionState::set_status(cx, format!("Loaded {}.", path.display()));
                    });
                }
                Err(e) => {
                    let _ = cx.update(|_window, cx| {
                        SessionState::set_status(cx, format!("Load failed: {e}"));
                    });
                }
            }
        })
        .detach();
    }

    // ========================================================================
    // Keyboard action handlers
    // ========================================================================

    #[cfg(feature = "keyboard-nav")]
    fn on_execute(
        &mut self,
        _: &editor_actions::ExecuteQuery,
        _window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        self.run(cx);
    }

    #[cfg(feature = "keyboard-nav")]
    fn on_format(
        &mut self,
        _: &editor_actions::FormatQuery,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        self.format(window, cx);
    }

    #[cfg(feature = "keyboard-nav")]
    fn on_save(
        &mut self,
        _: &editor_actions::SaveQuery,
        _window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        self.save(cx);
    }

    #[cfg(feature = "keyboard-nav")]
    fn on_load(
        &mut self,
        _: &editor_actions::LoadQuery,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        self.load(window, cx);
    }
}

/// Most recently modified `.sql` file in `dir`.
fn newest_sql_file(dir: &std::path::Path) -> Option<std::path::PathBuf> {
    let mut newest: Option<(std::time::SystemTime, std::path::PathBuf)> = None;

    for entry in std::fs::read_dir(dir).ok()? {
        let Ok(entry) = entry else { continue };
        let path = entry.path();
        let is_sql = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("sql"));
        if !path.is_file() || !is_sql {
            continue;
        }

        let Ok(modified) = entry.metadata().and_then(|m| m.modified()) else {
            continue;
        };
        if newest.as_ref().is_none_or(|(t, _)| modified > *t) {
            newest = Some((modified, path));
        }
    }

    newest.map(|(_, path)| path)
}

impl Render for Editor {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let panel = v_flex()
            .size_full()
            .key_context("Editor")
            .child(
                h_flex()
                    .gap_1()
                    .p_2()
                    .border_b_1()
                    .border_color(cx.theme().border)
                    .child(Label::new("SQL").font_bold().text_sm())
                    .child(div().flex_1())
                    .child(
                        Button::new("save-sql")
                            .label("Save")
                            .small()
                            .ghost()
                            .on_click(cx.listener(|this, _, _, cx| this.save(cx))),
                    )
                    .child(
                        Button::new("load-sql")
                            .label("Load")
                            .small()
                            .ghost()
                            .on_click(cx.listener(|this, _, window, cx| this.load(window, cx))),
                    )
                    .child(
                        Button::new("format-sql")
                            .label("Format")
                            .small()
                            .outline()
                            .on_click(cx.listener(|this, _, window, cx| this.format(window, cx))),
                    )
                    .child(
                        Button::new("run-sql")
                            .label("Run")
                            .small()
                            .primary()
                            .on_click(cx.listener(|this, _, _, cx| this.run(cx))),
                    ),
            )
            .child(
                div()
                    .flex_1()
                    .p_2()
                    .child(TextInput::new(&self.input).h_full()),
            );

        #[cfg(feature = "keyboard-nav")]
        let panel = panel
            .on_action(cx.listener(Self::on_execute))
            .on_action(cx.listener(Self::on_format))
            .on_action(cx.listener(Self::on_save))
            .on_action(cx.listener(Self::on_load));

        panel
    }
}
