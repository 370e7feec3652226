//! Query results pane: grid for row-returning statements, message for
//! everything else.

use gpui::*;
use gpui_component::{ActiveTheme as _, StyledExt as _, h_flex, label::Label, v_flex};

use crate::services::database::{QueryExecutionResult, SelectResult};

/// Display caps; a huge result set must not stall rendering.
const MAX_DISPLAY_ROWS: usize = 200;
const MAX_DISPLAY_COLS: usize = 50;

pub struct ResultsPanel {
    result: Option<QueryExecutionResult>,
}

impl ResultsPanel {
    pub fn view(_window: &mut Window, cx: &mut App) -> Entity<Self> {
        cx.new(|_cx| Self { result: None })
    }

    pub fn set_result(&mut self, result: QueryExecutionResult, cx: &mut Context<Self>) {
        self.result = Some(result);
        cx.notify();
    }

    pub fn clear(&mut self, cx: &mut Context<Self>) {
        self.result = None;
        cx.notify();
    }

    fn render_grid(&self, select: &SelectResult, cx: &mut Context<Self>) -> AnyElement {
        if select.rows.is_empty() {
            return Label::new("0 rows.")
                .p_2()
                .text_sm()
                .text_color(cx.theme().muted_foreground)
                .into_any_element();
        }

        let columns: Vec<String> = select
            .columns
            .iter()
            .take(MAX_DISPLAY_COLS)
            .map(|c| c.name.clone())
            .collect();

        let mut header = h_flex().gap_2().px_2().py_1().bg(cx.theme().secondary);
        for name in &columns {
            header = header.child(
                Label::new(truncate(name, 24))
                    .w_40()
                    .font_bold()
                    .text_xs()
                    .whitespace_nowrap(),
            );
        }

        let mut grid = v_flex().flex_1().overflow_hidden().child(header);

        for (ix, row) in select.rows.iter().take(MAX_DISPLAY_ROWS).enumerate() {
            let bg = if ix % 2 == 0 {
                cx.theme().list
            } else {
                cx.theme().list_even
            };

            let mut rendered = h_flex().gap_2().px_2().py_0p5().bg(bg);
            for cell in row.cells.iter().take(MAX_DISPLAY_COLS) {
                let text = truncate(&cell.to_display_string(), 40);
                let label = if cell.is_null() {
                    Label::new(text)
                        .w_40()
                        .text_xs()
                        .text_color(cx.theme().muted_foreground)
                } else {
                    Label::new(text).w_40().text_xs()
                };
                rendered = rendered.child(label.whitespace_nowrap());
            }
            grid = grid.child(rendered);
        }

        let mut footer_text = format!(
            "{} rows in {} ms.",
            select.row_count, select.execution_time_ms
        );
        if select.row_count > MAX_DISPLAY_ROWS {
            footer_text.push_str(&format!(" Showing first {MAX_DISPLAY_ROWS}."));
        }
        if select.columns.len() > MAX_DISPLAY_COLS {
            footer_text.push_str(&format!(" Showing first {MAX_DISPLAY_COLS} columns."));
        }

        grid.child(
            Label::new(footer_text)
                .px_2()
                .py_1()
                .text_xs()
                .text_color(cx.theme().muted_foreground),
        )
        .into_any_element()
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{cut}…")
    }
}

impl Render for ResultsPanel {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let body = match &self.result {
            None => Label::new("Run a query to see results here.")
                .p_2()
                .text_sm()
                .text_color(cx.theme().muted_foreground)
                .into_any_element(),
            Some(QueryExecutionResult::Select(select)) => {
                let select = select.clone();
                self.render_grid(&select, cx)
            }
            Some(QueryExecutionResult::Modified(modified)) => Label::new(format!(
                "OK. {} rows affected in {} ms.",
                modified.rows_affected, modified.execution_time_ms
            ))
            .p_2()
            .text_sm()
            .into_any_element(),
            Some(QueryExecutionResult::Error(error)) => Label::new(format!(
                "ERROR: {}",
                error.message
            ))
            .p_2()
            .text_sm()
            .text_color(cx.theme().danger)
            .into_any_element(),
        };

        v_flex()
            .size_full()
            .child(
                h_flex()
                    .p_2()
                    .border_b_1()
                    .border_color(cx.theme().border)
                    .child(Label::new("Result").font_bold().text_sm()),
            )
            .child(body)
    }
}
