//! Database templates tab: browse schema templates by theme, preview
//! their SQL, and apply one to the active database.

use gpui::prelude::FluentBuilder as _;
use gpui::*;
use gpui_component::{
    ActiveTheme as _, Sizable as _, StyledExt as _,
    button::{Button, ButtonVariants as _},
    checkbox::Checkbox,
    h_flex,
    label::Label,
    list::ListItem,
    v_flex,
};

use crate::services::templates::{self, SchemaTemplate};
use crate::state::SessionState;

/// Cap on preview lines so one giant template cannot swallow the panel.
const MAX_PREVIEW_LINES: usize = 40;

pub enum SchemaTemplatesEvent {
    /// A template was applied; the database tree should reload.
    SchemaChanged,
}

impl EventEmitter<SchemaTemplatesEvent> for SchemaTemplatesPanel {}

pub struct SchemaTemplatesPanel {
    selected_category: Option<String>,
    selected_template: Option<String>,
    include_data: bool,
    /// (title, text) currently previewed.
    preview: Option<(String, String)>,
    /// Template name awaiting apply confirmation.
    pending_apply: Option<String>,
    is_applying: bool,
    _subscriptions: Vec<Subscription>,
}

impl SchemaTemplatesPanel {
    pub fn view(_window: &mut Window, cx: &mut App) -> Entity<Self> {
        cx.new(|cx| Self::new(cx))
    }

    fn new(cx: &mut Context<Self>) -> Self {
        let _subscriptions = vec![cx.observe_global::<SessionState>(|_, cx| cx.notify())];

        Self {
            selected_category: None,
            selected_template: None,
            include_data: true,
            preview: None,
            pending_apply: None,
            is_applying: false,
            _subscriptions,
        }
    }

    fn find_selected(&self, cx: &Context<Self>) -> Option<SchemaTemplate> {
        let name = self.selected_template.as_ref()?;
        cx.global::<SessionState>()
            .catalog
            .find_schema(name)
            .cloned()
    }

    fn show_preview(&mut self, part: PreviewPart, cx: &mut Context<Self>) {
        let Some(template) = self.find_selected(cx) else {
            SessionState::set_status(cx, "Select a template first.");
            return;
        };

        let (title, statements) = match part {
            PreviewPart::Schema => ("schema", Some(&template.schema)),
            PreviewPart::Data => ("data", template.data.as_ref()),
        };

        let text = match statements {
            Some(statements) if !statements.is_empty() => statements.join(";\n\n") + ";",
            _ => "-- (no data statements)".to_string(),
        };

        self.preview = Some((format!("{} — {title} preview", template.name), text));
        cx.notify();
    }

    fn request_apply(&mut self, cx: &mut Context<Self>) {
        let Some(template) = self.find_selected(cx) else {
            SessionState::set_status(cx, "Select a template first.");
            return;
        };

        if cx.global::<SessionState>().active_database.is_none() {
            SessionState::set_status(cx, "Select a database in the Tester tab first.");
            return;
        }

        self.pending_apply = Some(template.name);
        cx.notify();
    }

    fn confirm_apply(&mut self, cx: &mut Context<Self>) {
        let Some(name) = self.pending_apply.take() else {
            return;
        };
        let Some(template) = cx
            .global::<SessionState>()
            .catalog
            .find_schema(&name)
            .cloned()
        else {
            return;
        };
        let Some(db) = cx.global::<SessionState>().active_database.clone() else {
            return;
        };

        let include_data = self.include_data;
        self.is_applying = true;
        cx.notify();

        cx.spawn(async move |this: WeakEntity<SchemaTemplatesPanel>, cx| {
            // Drop all user tables first so the template starts from a
            // clean slate.
            let outcome = match db.drop_all_tables().await {
                Ok(_) => templates::apply(&db, &template, include_data).await,
                Err(e) => Err(e),
            };

            let status = match &outcome {
                Ok(outcome) => outcome.describe(&template.name),
                Err(e) => format!("Could not apply '{}': {e}", template.name),
            };
            let succeeded = matches!(&outcome, Ok(o) if o.success());

            let _ = this.update(cx, |this, cx| {
                this.is_applying = false;
                SessionState::set_status(cx, status);
                if succeeded {
                    cx.emit(SchemaTemplatesEvent::SchemaChanged);
                }
                cx.notify();
            });
        })
        .detach();
    }

    fn render_categories(&self, cx: &mut Context<Self>) -> impl IntoElement {
        let catalog = cx.global::<SessionState>().catalog.clone();
        let categories = catalog.schema_categories();

        let mut list = v_flex()
            .gap_0p5()
            .p_2()
            .child(Label::new("Categories").font_bold().text_sm().pb_1());

        let all_selected = self.selected_category.is_none();
        list = list.child(
            ListItem::new("cat-all")
                .px_2()
                .py_1()
                .when(all_selected, |item| item.bg(cx.theme().list_active))
                .child(Label::new(format!("All ({})", catalog.schema_templates().len())).text_sm())
                .on_click(cx.listener(|this, _, _, cx| {
                    this.selected_category = None;
                    cx.notify();
                })),
        );

        for (ix, category) in categories.into_iter().enumerate() {
            let is_selected = self.selected_category.as_deref() == Some(&category);
            let count = catalog.schema_templates_in(&category).len();
            list = list.child(
                ListItem::new(("cat", ix))
                    .px_2()
                    .py_1()
                    .when(is_selected, |item| item.bg(cx.theme().list_active))
                    .child(Label::new(format!("{category} ({count})")).text_sm())
                    .on_click(cx.listener(move |this, _, _, cx| {
                        this.selected_category = Some(category.clone());
                        cx.notify();
                    })),
            );
        }

        list
    }

    fn render_template_rows(&self, cx: &mut Context<Self>) -> impl IntoElement {
        let catalog = cx.global::<SessionState>().catalog.clone();
        let templates: Vec<SchemaTemplate> = match &self.selected_category {
            Some(category) => catalog
                .schema_templates_in(category)
                .into_iter()
                .cloned()
                .collect(),
            None => {
                let mut all: Vec<_> = catalog.schema_templates().to_vec();
                all.sort_by(|a, b| (&a.category, &a.name).cmp(&(&b.category, &b.name)));
                all
            }
        };

        let mut list = v_flex().gap_0p5().flex_1().overflow_hidden();

        if templates.is_empty() {
            return list.child(
                Label::new("No templates in this category.")
                    .p_2()
                    .text_sm()
                    .text_color(cx.theme().muted_foreground),
            );
        }

        for (ix, template) in templates.into_iter().enumerate() {
            let is_selected = self.selected_template.as_deref() == Some(&template.name);
            let name = template.name.clone();
            let statements = template.schema.len();
            let data_note = if template.has_data() { "+data" } else { "" };

            list = list.child(
                ListItem::new(("dbtpl", ix))
                    .px_2()
                    .py_1()
                    .when(is_selected, |item| item.bg(cx.theme().list_active))
                    .child(
                        h_flex()
                            .gap_2()
                            .items_center()
                            .child(Label::new(template.name.clone()).text_sm())
                            .child(
                                Label::new(format!(
                                    "[{}] {statements} DDL {data_note}",
                                    template.category
                                ))
                                .text_xs()
                                .text_color(cx.theme().muted_foreground),
                            )
                            .child(
                                Label::new(template.description.clone())
                                    .text_xs()
                                    .text_color(cx.theme().muted_foreground)
                                    .whitespace_nowrap(),
                            ),
                    )
                    .on_click(cx.listener(move |this, _, _, cx| {
                        this.selected_template = Some(name.clone());
                        this.preview = None;
                        this.pending_apply = None;
                        cx.notify();
                    })),
            );
        }

        list
    }

    fn render_toolbar(&self, cx: &mut Context<Self>) -> impl IntoElement {
        h_flex()
            .gap_1()
            .p_2()
            .border_b_1()
            .border_color(cx.theme().border)
            .child(
                Button::new("preview-schema")
                    .label("Preview schema")
                    .small()
                    .ghost()
                    .on_click(cx.listener(|this, _, _, cx| {
                        this.show_preview(PreviewPart::Schema, cx)
                    })),
            )
            .child(
                Button::new("preview-data")
                    .label("Preview data")
                    .small()
                    .ghost()
                    .on_click(cx.listener(|this, _, _, cx| {
                        this.show_preview(PreviewPart::Data, cx)
                    })),
            )
            .child(div().flex_1())
            .child(
                Checkbox::new("include-data")
                    .label("Include sample data")
                    .checked(self.include_data)
                    .on_click(cx.listener(|this, checked: &bool, _, cx| {
                        this.include_data = *checked;
                        cx.notify();
                    })),
            )
            .child(
                Button::new("apply-template")
                    .label(if self.is_applying {
                        "Applying..."
                    } else {
                        "Apply to active DB"
                    })
                    .small()
                    .primary()
                    .on_click(cx.listener(|this, _, _, cx| this.request_apply(cx))),
            )
    }

    fn render_confirm_strip(&self, name: &str, cx: &mut Context<Self>) -> impl IntoElement {
        let db_name = cx
            .global::<SessionState>()
            .active_database
            .as_ref()
            .map(|db| db.name())
            .unwrap_or_default();

        h_flex()
            .gap_2()
            .p_2()
            .items_center()
            .bg(cx.theme().secondary)
            .border_b_1()
            .border_color(cx.theme().border)
            .child(
                Label::new(format!(
                    "Applying '{name}' will DROP all user tables in {db_name}. Proceed?"
                ))
                .text_sm(),
            )
            .child(div().flex_1())
            .child(
                Button::new("confirm-apply")
                    .label("Apply")
                    .small()
                    .danger()
                    .on_click(cx.listener(|this, _, _, cx| this.confirm_apply(cx))),
            )
            .child(
                Button::new("cancel-apply")
                    .label("Cancel")
                    .small()
                    .ghost()
                    .on_click(cx.listener(|this, _, _, cx| {
                        this.pending_apply = None;
                        cx.notify();
                    })),
            )
    }

    fn render_preview(&self, title: &str, text: &str, cx: &mut Context<Self>) -> impl IntoElement {
        let lines: Vec<&str> = text.lines().collect();
        let total = lines.len();
        let mut shown: String = lines
            .iter()
            .take(MAX_PREVIEW_LINES)
            .copied()
            .collect::<Vec<_>>()
            .join("\n");
        if total > MAX_PREVIEW_LINES {
            shown.push_str(&format!("\n… ({} more lines)", total - MAX_PREVIEW_LINES));
        }

        v_flex()
            .gap_1()
            .p_2()
            .border_t_1()
            .border_color(cx.theme().border)
            .child(
                h_flex()
                    .child(Label::new(title.to_string()).font_bold().text_sm())
                    .child(div().flex_1())
                    .child(
                        Button::new("close-preview")
                            .label("Close")
                            .small()
                            .ghost()
                            .on_click(cx.listener(|this, _, _, cx| {
                                this.preview = None;
                                cx.notify();
                            })),
                    ),
            )
            .child(
                div()
                    .p_2()
                    .bg(cx.theme().secondary)
                    .rounded(cx.theme().radius)
                    .overflow_hidden()
                    .child(Label::new(shown).text_xs().font_family("monospace")),
            )
    }
}

#[derive(Clone, Copy)]
enum PreviewPart {
    Schema,
    Data,
}

impl Render for SchemaTemplatesPanel {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let mut right = v_flex().flex_1().h_full().child(self.render_toolbar(cx));

        if let Some(name) = self.pending_apply.clone() {
            right = right.child(self.render_confirm_strip(&name, cx));
        }

        right = right.child(self.render_template_rows(cx));

        if let Some((title, text)) = self.preview.clone() {
            right = right.child(self.render_preview(&title, &text, cx));
        }

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
                    .child(self.render_categories(cx)),
            )
            .child(right)
    }
}
