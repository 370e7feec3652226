//! Database catalog tree: databases → tables → columns.
//!
//! Scans the configured directory for SQLite files and lazily loads
//! tables and columns on expansion. Clicking a database makes it the
//! active one.

use std::path::PathBuf;
use std::sync::Arc;

use gpui::prelude::FluentBuilder as _;
use gpui::*;
use gpui_component::{
    ActiveTheme as _, Sizable as _, StyledExt as _,
    button::{Button, ButtonVariants as _},
    h_flex,
    input::{Input as TextInput, InputState},
    label::Label,
    list::ListItem,
    v_flex,
};

use crate::services::database::{ColumnDetail, TableInfo, TestDatabase, TestDatabaseManager};
use crate::state::SessionState;

/// A table row with lazily loaded columns.
struct TableEntry {
    info: TableInfo,
    expanded: bool,
    columns: Option<Vec<ColumnDetail>>,
}

/// A database file row with lazily loaded tables.
struct DatabaseEntry {
    path: PathBuf,
    expanded: bool,
    error: Option<String>,
    tables: Option<Vec<TableEntry>>,
}

impl DatabaseEntry {
    fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

pub struct DatabaseTree {
    entries: Vec<DatabaseEntry>,
    scanned_dir: Option<PathBuf>,
    name_input: Entity<InputState>,
    _subscriptions: Vec<Subscription>,
}

impl DatabaseTree {
    pub fn view(window: &mut Window, cx: &mut App) -> Entity<Self> {
        cx.new(|cx| Self::new(window, cx))
    }

    fn new(window: &mut Window, cx: &mut Context<Self>) -> Self {
        let name_input = cx.new(|cx| InputState::new(window, cx).placeholder("new_test.db"));

        let _subscriptions = vec![cx.observe_global::<SessionState>(move |this, cx| {
            let dir = cx.global::<SessionState>().database_dir.clone();
            if dir != this.scanned_dir {
                this.scanned_dir = dir;
                this.rescan(cx);
            }
            cx.notify();
        })];

        Self {
            entries: Vec::new(),
            scanned_dir: None,
            name_input,
            _subscriptions,
        }
    }

    /// Rescan the catalog directory, keeping expansion state for files
    /// that are still there.
    pub fn refresh(&mut self, cx: &mut Context<Self>) {
        self.scanned_dir = cx.global::<SessionState>().database_dir.clone();
        self.rescan(cx);
    }

    fn rescan(&mut self, cx: &mut Context<Self>) {
        let Some(dir) = self.scanned_dir.clone() else {
            self.entries.clear();
            cx.notify();
            return;
        };

        let found = match TestDatabaseManager::scan_directory(&dir) {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), "catalog scan failed: {e}");
                Vec::new()
            }
        };

        let state = cx.global::<SessionState>();
        let expanded_before: Vec<PathBuf> = self
            .entries
            .iter()
            .filter(|e| e.expanded)
            .map(|e| e.path.clone())
            .collect();

        self.entries = found
            .into_iter()
            .filter(|path| !state.is_protected_path(path))
            .map(|path| DatabaseEntry {
                expanded: expanded_before.contains(&path),
                path,
                error: None,
                tables: None,
            })
            .collect();

        // Reload tables for the rows that are still expanded.
        let to_load: Vec<PathBuf> = self
            .entries
            .iter()
            .filter(|e| e.expanded)
            .map(|e| e.path.clone())
            .collect();
        for path in to_load {
            self.load_tables(path, cx);
        }

        cx.notify();
    }

    fn toggle_database(&mut self, ix: usize, cx: &mut Context<Self>) {
        let Some(entry) = self.entries.get_mut(ix) else {
            return;
        };
        entry.expanded = !entry.expanded;
        let path = entry.path.clone();
        let needs_load = entry.expanded && entry.tables.is_none();

        if needs_load {
            self.load_tables(path.clone(), cx);
        }

        // Selecting a database also makes it active.
        self.activate(path, cx);
        cx.notify();
    }

    fn activate(&mut self, path: PathBuf, cx: &mut Context<Self>) {
        let manager = cx.global::<SessionState>().manager.clone();

        cx.spawn(async move |this: WeakEntity<DatabaseTree>, cx| {
            match manager.open(&path).await {
                Ok(db) => {
                    let _ = cx.update(|cx| SessionState::set_active_database(cx, db));
                }
                Err(e) => {
                    let message = e.to_string();
                    let _ = this.update(cx, |this, cx| {
                        if let Some(entry) = this.entries.iter_mut().find(|x| x.path == path) {
                            entry.error = Some(message.clone());
                        }
                        SessionState::set_status(cx, format!("Could not open database: {message}"));
                        cx.notify();
                    });
                }
            }
        })
        .detach();
    }

    fn load_tables(&mut self, path: PathBuf, cx: &mut Context<Self>) {
        let manager = cx.global::<SessionState>().manager.clone();

        cx.spawn(async move |this: WeakEntity<DatabaseTree>, cx| {
            let result = load_tables_for(&manager, &path).await;

            let _ = this.update(cx, |this, cx| {
                if let Some(entry) = this.entries.iter_mut().find(|x| x.path == path) {
                    match result {
                        Ok(tables) => {
                            entry.error = None;
                            entry.tables = Some(
                                tables
                                    .into_iter()
                                    .map(|info| TableEntry {
                                        info,
                                        expanded: false,
                                        columns: None,
                                    })
                                    .collect(),
                            );
                        }
                        Err(message) => entry.error = Some(message),
                    }
                }
                cx.notify();
            });
        })
        .detach();
    }

    fn toggle_table(&mut self, db_ix: usize, table_ix: usize, cx: &mut Context<Self>) {
        let Some(entry) = self.entries.get_mut(db_ix) else {
            return;
        };
        let path = entry.path.clone();
        let Some(table) = entry.tables.as_mut().and_then(|t| t.get_mut(table_ix)) else {
            return;
        };

        table.expanded = !table.expanded;
        let needs_load = table.expanded && table.columns.is_none();
        let table_name = table.info.name.clone();

        if needs_load {
            let manager = cx.global::<SessionState>().manager.clone();
            cx.spawn(async move |this: WeakEntity<DatabaseTree>, cx| {
                let result = load_columns_for(&manager, &path, &table_name).await;

                let _ = this.update(cx, |this, cx| {
                    if let Some(entry) = this.entries.iter_mut().find(|x| x.path == path) {
                        if let Some(table) = entry
                            .tables
                            .as_mut()
                            .and_then(|t| t.iter_mut().find(|t| t.info.name == table_name))
                        {
                            match result {
                                Ok(columns) => table.columns = Some(columns),
                                Err(message) => entry.error = Some(message),
                            }
                        }
                    }
                    cx.notify();
                });
            })
            .detach();
        }

        cx.notify();
    }

    fn create_database(&mut self, cx: &mut Context<Self>) {
        let name = self.name_input.read(cx).value().trim().to_string();
        if name.is_empty() {
            SessionState::set_status(cx, "Enter a file name for the new database.");
            return;
        }

        let Some(dir) = self.scanned_dir.clone() else {
            SessionState::set_status(cx, "No database directory configured yet.");
            return;
        };

        let mut path = dir.join(&name);
        if path.extension().is_none() {
            path.set_extension("db");
        }

        if cx.global::<SessionState>().is_protected_path(&path) {
            SessionState::set_status(cx, "That name is reserved. Choose another file name.");
            return;
        }

        let manager = cx.global::<SessionState>().manager.clone();
        cx.spawn(async move |this: WeakEntity<DatabaseTree>, cx| {
            match manager.create(&path).await {
                Ok(db) => {
                    let _ = cx.update(|cx| {
                        SessionState::set_active_database(cx, db);
                        SessionState::set_status(
                            cx,
                            format!("Created {}.", path.display()),
                        );
                    });
                    let _ = this.update(cx, |this, cx| this.refresh(cx));
                }
                Err(e) => {
                    let _ = cx.update(|cx| {
                        SessionState::set_status(cx, format!("Could not create database: {e}"));
                    });
                }
            }
        })
        .detach();
    }

    fn render_header(&mut self, cx: &mut Context<Self>) -> impl IntoElement {
        v_flex()
            .gap_2()
            .p_2()
            .border_b_1()
            .border_color(cx.theme().border)
            .child(Label::new("Databases").font_bold().text_sm())
            .child(
                h_flex()
                    .gap_1()
                    .child(div().flex_1().child(TextInput::new(&self.name_input)))
                    .child(
                        Button::new("new-db")
                            .label("New")
                            .small()
                            .outline()
                            .on_click(cx.listener(|this, _, _, cx| this.create_database(cx))),
                    )
                    .child(
                        Button::new("refresh-dbs")
                            .label("Refresh")
                            .small()
                            .ghost()
                            .on_click(cx.listener(|this, _, _, cx| this.refresh(cx))),
                    ),
            )
    }

    fn render_database_row(
        &self,
        ix: usize,
        entry: &DatabaseEntry,
        is_active: bool,
        cx: &mut Context<Self>,
    ) -> impl IntoElement {
        let marker = if entry.expanded { "▾" } else { "▸" };
        let text_color = if is_active {
            cx.theme().accent_foreground
        } else {
            cx.theme().foreground
        };

        ListItem::new(("db", ix))
            .w_full()
            .px_2()
            .py_1()
            .when(is_active, |item| item.bg(cx.theme().list_active))
            .child(
                h_flex()
                    .gap_1()
                    .items_center()
                    .text_color(text_color)
                    .child(Label::new(marker.to_string()).text_xs())
                    .child(Label::new(entry.file_name()).text_sm().whitespace_nowrap()),
            )
            .on_click(cx.listener(move |this, _, _, cx| this.toggle_database(ix, cx)))
    }

    fn render_table_row(
        &self,
        db_ix: usize,
        table_ix: usize,
        table: &TableEntry,
        cx: &mut Context<Self>,
    ) -> impl IntoElement {
        let marker = if table.expanded { "▾" } else { "▸" };
        let label = if table.info.is_view() {
            format!("{} (view)", table.info.name)
        } else {
            table.info.name.clone()
        };

        ListItem::new(("table", db_ix * 10_000 + table_ix))
            .w_full()
            .pl_6()
            .py_0p5()
            .child(
                h_flex()
                    .gap_1()
                    .items_center()
                    .child(Label::new(marker.to_string()).text_xs())
                    .child(Label::new(label).text_sm().whitespace_nowrap()),
            )
            .on_click(cx.listener(move |this, _, _, cx| {
                this.toggle_table(db_ix, table_ix, cx)
            }))
    }

    fn render_entry(
        &self,
        ix: usize,
        entry: &DatabaseEntry,
        cx: &mut Context<Self>,
    ) -> impl IntoElement {
        let is_active = cx
            .global::<SessionState>()
            .active_database
            .as_ref()
            .map(|db| db.path() == entry.path)
            .unwrap_or(false);

        let mut container = v_flex().child(self.render_database_row(ix, entry, is_active, cx));

        if let Some(error) = &entry.error {
            container = container.child(
                Label::new(truncate(error, 60))
                    .pl_6()
                    .text_xs()
                    .text_color(cx.theme().danger),
            );
        }

        if entry.expanded {
            match &entry.tables {
                None => {
                    container = container.child(
                        Label::new("Loading...")
                            .pl_6()
                            .text_xs()
                            .text_color(cx.theme().muted_foreground),
                    );
                }
                Some(tables) if tables.is_empty() => {
                    container = container.child(
                        Label::new("(no tables)")
                            .pl_6()
                            .text_xs()
                            .text_color(cx.theme().muted_foreground),
                    );
                }
                Some(tables) => {
                    for (table_ix, table) in tables.iter().enumerate() {
                        container =
                            container.child(self.render_table_row(ix, table_ix, table, cx));
                        if table.expanded {
                            if let Some(columns) = &table.columns {
                                for column in columns {
                                    container = container.child(
                                        Label::new(column.display_label())
                                            .pl_10()
                                            .text_xs()
                                            .text_color(cx.theme().muted_foreground),
                                    );
                                }
                            }
                        }
                    }
                }
            }
        }

        container
    }
}

async fn load_tables_for(
    manager: &Arc<TestDatabaseManager>,
    path: &PathBuf,
) -> Result<Vec<TableInfo>, String> {
    let db: Arc<TestDatabase> = manager.open(path).await.map_err(|e| e.to_string())?;
    db.tables().await.map_err(|e| e.to_string())
}

async fn load_columns_for(
    manager: &Arc<TestDatabaseManager>,
    path: &PathBuf,
    table: &str,
) -> Result<Vec<ColumnDetail>, String> {
    let db: Arc<TestDatabase> = manager.open(path).await.map_err(|e| e.to_string())?;
    db.columns(table).await.map_err(|e| e.to_string())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{cut}…")
    }
}

impl Render for DatabaseTree {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let mut list = v_flex().flex_1().overflow_hidden().p_1().gap_0p5();

        if self.entries.is_empty() {
            list = list.child(
                Label::new("No databases yet. Create one above.")
                    .p_2()
                    .text_xs()
                    .text_color(cx.theme().muted_foreground),
            );
        } else {
            let rendered: Vec<_> = self
                .entries
                .iter()
                .enumerate()
                .map(|(ix, entry)| self.render_entry(ix, entry, cx).into_any_element())
                .collect();
            for element in rendered {
                list = list.child(element);
            }
        }

        v_flex()
            .size_full()
            .bg(cx.theme().sidebar)
            .child(self.render_header(cx))
            .child(list)
    }
}
