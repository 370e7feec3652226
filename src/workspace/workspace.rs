//! Main workspace: the three tabs, event wiring between panels, and the
//! status footer.

use gpui::prelude::FluentBuilder as _;
use gpui::*;
use gpui_component::{
    ActiveTheme as _, Sizable as _, StyledExt as _,
    button::{Button, ButtonVariants as _},
    h_flex,
    label::Label,
    v_flex,
};

#[cfg(feature = "keyboard-nav")]
use crate::keybindings::global;
use crate::services::database::QueryExecutionResult;
use crate::state::SessionState;

use super::db_tree::DatabaseTree;
use super::editor::{Editor, EditorEvent};
use super::query_templates::{QueryTemplatesEvent, QueryTemplatesPanel};
use super::results::ResultsPanel;
use super::schema_templates::{SchemaTemplatesEvent, SchemaTemplatesPanel};

/// Currently visible tab.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceTab {
    Tester,
    QueryTemplates,
    SchemaTemplates,
}

impl WorkspaceTab {
    fn title(&self) -> &'static str {
        match self {
            Self::Tester => "Tester",
            Self::QueryTemplates => "Query Templates",
            Self::SchemaTemplates => "Database Templates",
        }
    }

    fn all() -> [WorkspaceTab; 3] {
        [Self::Tester, Self::QueryTemplates, Self::SchemaTemplates]
    }
}

pub struct Workspace {
    tab: WorkspaceTab,

    db_tree: Entity<DatabaseTree>,
    editor: Entity<Editor>,
    results: Entity<ResultsPanel>,
    query_templates: Entity<QueryTemplatesPanel>,
    schema_templates: Entity<SchemaTemplatesPanel>,

    _subscriptions: Vec<Subscription>,
}

impl Workspace {
    pub fn new(window: &mut Window, cx: &mut Context<Self>) -> Self {
        let db_tree = DatabaseTree::view(window, cx);
        let editor = Editor::view(window, cx);
        let results = ResultsPanel::view(window, cx);
        let query_templates = QueryTemplatesPanel::view(window, cx);
        let schema_templates = SchemaTemplatesPanel::view(window, cx);

        let _subscriptions = vec![
            cx.observe_global::<SessionState>(|_, cx| cx.notify()),
            cx.subscribe(&editor, |this, _, event: &EditorEvent, cx| match event {
                EditorEvent::ExecuteQuery(sql) => this.execute_query(sql.clone(), cx),
            }),
            cx.subscribe_in(
                &query_templates,
                window,
                |this, _, event: &QueryTemplatesEvent, window, cx| match event {
                    QueryTemplatesEvent::LoadToTester(sql) => {
                        this.load_into_editor(sql.clone(), window, cx);
                    }
                },
            ),
            cx.subscribe(
                &schema_templates,
                |this, _, event: &SchemaTemplatesEvent, cx| match event {
                    SchemaTemplatesEvent::SchemaChanged => {
                        this.db_tree.update(cx, |tree, cx| tree.refresh(cx));
                    }
                },
            ),
        ];

        Self {
            tab: WorkspaceTab::Tester,
            db_tree,
            editor,
            results,
            query_templates,
            schema_templates,
            _subscriptions,
        }
    }

    fn load_into_editor(&mut self, sql: String, window: &mut Window, cx: &mut Context<Self>) {
        self.editor.update(cx, |editor, cx| {
            editor.set_text(sql, window, cx);
        });
        self.tab = WorkspaceTab::Tester;
        cx.notify();
    }

    fn execute_query(&mut self, sql: String, cx: &mut Context<Self>) {
        let Some(db) = cx.global::<SessionState>().active_database.clone() else {
            SessionState::set_status(cx, "Select a database on the left tree first.");
            return;
        };

        SessionState::set_status(cx, "Running...");
        let results = self.results.clone();
        let db_tree = self.db_tree.clone();

        cx.spawn(async move |_this: WeakEntity<Workspace>, cx| {
            let outcome = db.run_script(&sql).await;

            let _ = cx.update(|cx| match outcome {
                Ok(result) => {
                    let status = match &result {
                        QueryExecutionResult::Select(s) => {
                            format!("{} rows returned.", s.row_count)
                        }
                        QueryExecutionResult::Modified(m) => {
                            format!("OK. {} rows affected.", m.rows_affected)
                        }
                        QueryExecutionResult::Error(_) => {
                            "Error during execution (see result pane).".to_string()
                        }
                    };
                    SessionState::set_status(cx, status);
                    results.update(cx, |panel, cx| panel.set_result(result, cx));
                    // Schema might have changed.
                    db_tree.update(cx, |tree, cx| tree.refresh(cx));
                }
                Err(e) => {
                    SessionState::set_status(cx, format!("Query failed: {e}"));
                }
            });
        })
        .detach();
    }

    fn refresh_all(&mut self, cx: &mut Context<Self>) {
        self.db_tree.update(cx, |tree, cx| tree.refresh(cx));
        SessionState::set_status(cx, "Refreshed.");
    }

    // ========================================================================
    // Keyboard action handlers
    // ========================================================================

    #[cfg(feature = "keyboard-nav")]
    fn on_switch_tester(
        &mut self,
        _: &global::SwitchToTester,
        _window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        self.tab = WorkspaceTab::Tester;
        cx.notify();
    }

    #[cfg(feature = "keyboard-nav")]
    fn on_switch_query_templates(
        &mut self,
        _: &global::SwitchToQueryTemplates,
        _window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        self.tab = WorkspaceTab::QueryTemplates;
        cx.notify();
    }

    #[cfg(feature = "keyboard-nav")]
    fn on_switch_schema_templates(
        &mut self,
        _: &global::SwitchToSchemaTemplates,
        _window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        self.tab = WorkspaceTab::SchemaTemplates;
        cx.notify();
    }

    #[cfg(feature = "keyboard-nav")]
    fn on_refresh_all(
        &mut self,
        _: &global::RefreshAll,
        _window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        self.refresh_all(cx);
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    fn render_header(&mut self, cx: &mut Context<Self>) -> impl IntoElement {
        let mut tabs = h_flex().gap_1();
        for (ix, tab) in WorkspaceTab::all().into_iter().enumerate() {
            let is_current = self.tab == tab;
            tabs = tabs.child(
                Button::new(("tab", ix))
                    .label(tab.title())
                    .small()
                    .when(is_current, |b| b.primary())
                    .when(!is_current, |b| b.ghost())
                    .on_click(cx.listener(move |this, _, _, cx| {
                        this.tab = tab;
                        cx.notify();
                    })),
            );
        }

        h_flex()
            .gap_2()
            .px_3()
            .py_2()
            .items_center()
            .border_b_1()
            .border_color(cx.theme().border)
            .child(Label::new("litebench").font_bold().text_sm())
            .child(tabs)
            .child(div().flex_1())
            .child(
                Button::new("refresh-all")
                    .label("Refresh")
                    .small()
                    .ghost()
                    .on_click(cx.listener(|this, _, _, cx| this.refresh_all(cx))),
            )
    }

    fn render_footer(&mut self, cx: &mut Context<Self>) -> impl IntoElement {
        let state = cx.global::<SessionState>();
        let status = state.status.clone();
        let active = state
            .active_database
            .as_ref()
            .map(|db| db.name())
            .unwrap_or_else(|| "no active DB".to_string());

        h_flex()
            .px_3()
            .py_1()
            .gap_2()
            .border_t_1()
            .border_color(cx.theme().border)
            .child(Label::new(status).text_xs())
            .child(div().flex_1())
            .child(
                Label::new(active)
                    .text_xs()
                    .text_color(cx.theme().muted_foreground),
            )
    }

    fn render_tester(&mut self, cx: &mut Context<Self>) -> impl IntoElement {
        h_flex()
            .flex_1()
            .size_full()
            .overflow_hidden()
            .child(
                v_flex()
                    .w_80()
                    .h_full()
                    .border_r_1()
                    .border_color(cx.theme().border)
                    .child(self.db_tree.clone()),
            )
            .child(
                v_flex()
                    .flex_1()
                    .h_full()
                    .child(
                        div()
                            .flex_1()
                            .border_b_1()
                            .border_color(cx.theme().border)
                            .child(self.editor.clone()),
                    )
                    .child(div().flex_1().overflow_hidden().child(self.results.clone())),
            )
    }
}

impl Render for Workspace {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let content = match self.tab {
            WorkspaceTab::Tester => self.render_tester(cx).into_any_element(),
            WorkspaceTab::QueryTemplates => self.query_templates.clone().into_any_element(),
            WorkspaceTab::SchemaTemplates => self.schema_templates.clone().into_any_element(),
        };

        let root = v_flex()
            .size_full()
            .bg(cx.theme().background)
            .text_color(cx.theme().foreground)
            .child(self.render_header(cx))
            .child(div().flex_1().overflow_hidden().child(content))
            .child(self.render_footer(cx));

        #[cfg(feature = "keyboard-nav")]
        let root = root
            .on_action(cx.listener(Self::on_switch_tester))
            .on_action(cx.listener(Self::on_switch_query_templates))
            .on_action(cx.listener(Self::on_switch_schema_templates))
            .on_action(cx.listener(Self::on_refresh_all));

        root
    }
}
