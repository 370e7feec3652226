//! Query templates tab: browse the catalog by statement class, search,
//! and send a snippet to the Tester editor.

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

use crate::services::templates::{QueryTemplate, StatementClass, TemplateCatalog};
use crate::state::SessionState;

/// Keep the rendered list bounded; the full catalog can be thousands of
/// snippets.
const MAX_DISPLAY_TEMPLATES: usize = 200;

pub enum QueryTemplatesEvent {
    /// Load this SQL into the Tester editor.
    LoadToTester(String),
}

impl EventEmitter<QueryTemplatesEvent> for QueryTemplatesPanel {}

pub struct QueryTemplatesPanel {
    /// `None` means "All".
    selected_class: Option<StatementClass>,
    /// Identity of the selected template within the filtered view.
    selected: Option<(StatementClass, String)>,
    search_input: Entity<InputState>,
    import_input: Entity<InputState>,
    _subscriptions: Vec<Subscription>,
}

impl QueryTemplatesPanel {
    pub fn view(window: &mut Window, cx: &mut App) -> Entity<Self> {
        cx.new(|cx| Self::new(window, cx))
    }

    fn new(window: &mut Window, cx: &mut Context<Self>) -> Self {
        let search_input = cx.new(|cx| InputState::new(window, cx).placeholder("Search templates"));
        let import_input =
            cx.new(|cx| InputState::new(window, cx).placeholder("/path/to/templates.json"));

        let _subscriptions = vec![
            cx.observe(&search_input, |_, _, cx| cx.notify()),
            cx.observe_global::<SessionState>(|_, cx| cx.notify()),
        ];

        Self {
            selected_class: None,
            selected: None,
            search_input,
            import_input,
            _subscriptions,
        }
    }

    fn filtered<'a>(
        &self,
        catalog: &'a TemplateCatalog,
        cx: &Context<Self>,
    ) -> Vec<&'a QueryTemplate> {
        let query = self.search_input.read(cx).value().trim().to_string();

        let mut templates = if query.is_empty() {
            let mut all: Vec<_> = catalog.query_templates().iter().collect();
            all.sort_by(|a, b| (a.class.as_str(), &a.title).cmp(&(b.class.as_str(), &b.title)));
            all
        } else {
            catalog.search(&query)
        };

        if let Some(class) = self.selected_class {
            templates.retain(|t| t.class == class);
        }

        templates
    }

    fn select_class(&mut self, class: Option<StatementClass>, cx: &mut Context<Self>) {
        self.selected_class = class;
        self.selected = None;
        cx.notify();
    }

    fn load_selected(&mut self, cx: &mut Context<Self>) {
        let Some((class, title)) = self.selected.clone() else {
            SessionState::set_status(cx, "Select a template first.");
            return;
        };

        let catalog = cx.global::<SessionState>().catalog.clone();
        if let Some(template) = catalog.find_query(class, &title) {
            SessionState::set_status(cx, format!("Loaded query template '{title}' to editor."));
            cx.emit(QueryTemplatesEvent::LoadToTester(template.sql.clone()));
        }
    }

    fn import(&mut self, cx: &mut Context<Self>) {
        let path = self.import_input.read(cx).value().trim().to_string();
        if path.is_empty() {
            SessionState::set_status(cx, "Enter a JSON file path to import.");
            return;
        }

        let incoming = match TemplateCatalog::load(&path) {
            Ok(incoming) => incoming,
            Err(e) => {
                SessionState::set_status(cx, format!("Import failed: {e}"));
                return;
            }
        };

        let imported_queries = incoming.query_templates().len();
        let imported_schemas = incoming.schema_templates().len();

        let current = cx.global::<SessionState>().catalog.clone();
        match current.merge(incoming) {
            Ok(merged) => {
                SessionState::set_catalog(cx, merged);
                SessionState::set_status(
                    cx,
                    format!(
                        "Imported {imported_queries} query and {imported_schemas} schema templates."
                    ),
                );
            }
            Err(e) => SessionState::set_status(cx, format!("Import failed: {e}")),
        }
        cx.notify();
    }

    fn render_class_list(&self, catalog: &TemplateCatalog, cx: &mut Context<Self>) -> impl IntoElement {
        let mut list = v_flex()
            .gap_0p5()
            .p_2()
            .child(Label::new("Classes").font_bold().text_sm().pb_1());

        let all_selected = self.selected_class.is_none();
        list = list.child(
            ListItem::new("class-all")
                .px_2()
                .py_1()
                .when(all_selected, |item| item.bg(cx.theme().list_active))
                .child(Label::new(format!("All ({})", catalog.query_templates().len())).text_sm())
                .on_click(cx.listener(|this, _, _, cx| this.select_class(None, cx))),
        );

        for (ix, class) in StatementClass::all().into_iter().enumerate() {
            let count = catalog.filter_by_class(class).len();
            let is_selected = self.selected_class == Some(class);
            list = list.child(
                ListItem::new(("class", ix))
                    .px_2()
                    .py_1()
                    .when(is_selected, |item| item.bg(cx.theme().list_active))
                    .child(
                        h_flex()
                            .gap_2()
                            .child(Label::new(format!("{class} ({count})")).text_sm())
                            .child(
                                Label::new(class.description())
                                    .text_xs()
                                    .text_color(cx.theme().muted_foreground),
                            ),
                    )
                    .on_click(cx.listener(move |this, _, _, cx| {
                        this.select_class(Some(class), cx)
                    })),
            );
        }

        list
    }

    fn render_template_rows(&self, cx: &mut Context<Self>) -> impl IntoElement {
        let catalog = cx.global::<SessionState>().catalog.clone();
        let filtered = self.filtered(&catalog, cx);
        let total = filtered.len();

        let mut list = v_flex().gap_0p5().flex_1().overflow_hidden();

        if total == 0 {
            return list.child(
                Label::new("No templates match.")
                    .p_2()
                    .text_sm()
                    .text_color(cx.theme().muted_foreground),
            );
        }

        for (ix, template) in filtered.into_iter().take(MAX_DISPLAY_TEMPLATES).enumerate() {
            let identity = (template.class, template.title.clone());
            let is_selected = self.selected.as_ref() == Some(&identity);

            list = list.child(
                ListItem::new(("qtpl", ix))
                    .px_2()
                    .py_1()
                    .when(is_selected, |item| item.bg(cx.theme().list_active))
                    .child(
                        h_flex()
                            .gap_2()
                            .items_center()
                            .child(
                                Label::new(format!("[{}]", template.class))
                                    .text_xs()
                                    .text_color(cx.theme().muted_foreground),
                            )
                            .child(Label::new(template.title.clone()).text_sm())
                            .child(
                                Label::new(template.description.clone())
                                    .text_xs()
                                    .text_color(cx.theme().muted_foreground)
                                    .whitespace_nowrap(),
                            ),
                    )
                    .on_click(cx.listener(move |this, _, _, cx| {
                        this.selected = Some(identity.clone());
                        cx.notify();
                    })),
            );
        }

        if total > MAX_DISPLAY_TEMPLATES {
            list = list.child(
                Label::new(format!(
                    "Showing first {MAX_DISPLAY_TEMPLATES} of {total}. Narrow the search."
                ))
                .p_2()
                .text_xs()
                .text_color(cx.theme().muted_foreground),
            );
        }

        list
    }
}

impl Render for QueryTemplatesPanel {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let catalog = cx.global::<SessionState>().catalog.clone();

        h_flex()
            .size_full()
            .items_start()
            .child(
                v_flex()
                    .w_64()
                    .h_full()
                    .border_r_1()
                    .border_color(cx.theme().border)
                    .bg(cx.theme().sidebar)
                    .child(self.render_class_list(&catalog, cx)),
            )
            .child(
                v_flex()
                    .flex_1()
                    .h_full()
                    .child(
                        h_flex()
                            .gap_1()
                            .p_2()
                            .border_b_1()
                            .border_color(cx.theme().border)
                            .child(div().flex_1().child(TextInput::new(&self.search_input)))
                            .child(
                                Button::new("load-to-tester")
                                    .label("Load to Tester")
                                    .small()
                                    .primary()
                                    .on_click(cx.listener(|this, _, _, cx| this.load_selected(cx))),
                            ),
                    )
                    .child(self.render_template_rows(cx))
                    .child(
                        h_flex()
                            .gap_1()
                            .p_2()
                            .border_t_1()
                            .border_color(cx.theme().border)
                            .child(div().flex_1().child(TextInput::new(&self.import_input)))
                            .child(
                                Button::new("import-json")
                                    .label("Import from JSON")
                                    .small()
                                    .outline()
                                    .on_click(cx.listener(|this, _, _, cx| this.import(cx))),
                            ),
                    ),
            )
    }
}
