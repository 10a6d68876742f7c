//! Search result table: row state, filtering, paging and HTML output.

use super::escape;
use super::tags::{ColumnFilter, TagFilter};
use crate::api::{display_value, value_parts, ResultRow};
use crate::highlight::LogBlock;
use serde_json::Value;
use std::collections::BTreeMap;

pub const LOGLINES_COLUMN: &str = "loglines";
pub const TAGS_COLUMN: &str = "tags";

const SPAMSCORE_COLUMN: &str = "spamscore";
const VIRUSRESULT_COLUMN: &str = "virusresult";
const SPAM_THRESHOLD: f64 = 5.0;

/// One result row with its expand state and log block.
#[derive(Debug, Clone)]
pub struct TableRow {
    pub data: ResultRow,
    pub expanded: bool,
    pub show_empty: bool,
    pub log: LogBlock,
}

impl TableRow {
    fn new(data: ResultRow) -> Self {
        let text = data
            .get(LOGLINES_COLUMN)
            .map(|v| value_parts(v).join("\n"))
            .unwrap_or_default();
        Self {
            data,
            expanded: false,
            show_empty: false,
            log: LogBlock::from_text(&text),
        }
    }

    fn cell(&self, column: &str) -> Option<&Value> {
        self.data.get(column)
    }
}

/// Cell flagged as dangerous: high spam score or infected mail.
pub fn is_danger(column: &str, value: &Value) -> bool {
    match column {
        SPAMSCORE_COLUMN => {
            let score = match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            };
            score.is_some_and(|s| s >= SPAM_THRESHOLD)
        }
        VIRUSRESULT_COLUMN => display_value(value).contains("INFECTED"),
        _ => false,
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    value.map_or(true, |v| value_parts(v).iter().all(|p| p.is_empty()))
}

#[derive(Debug)]
pub struct ResultTable {
    default_visible: Vec<String>,
    visibility: BTreeMap<String, bool>,
    columns: Vec<String>,
    rows: Vec<TableRow>,
    filters: BTreeMap<String, ColumnFilter>,
    page: usize,
    page_size: usize,
    loading: bool,
}

impl ResultTable {
    pub fn new(visible_columns: Vec<String>, page_size: usize) -> Self {
        Self {
            default_visible: visible_columns,
            visibility: BTreeMap::new(),
            columns: Vec::new(),
            rows: Vec::new(),
            filters: BTreeMap::new(),
            page: 0,
            page_size: page_size.max(1),
            loading: false,
        }
    }

    /// Drop rows, filters and paging and enter the loading state.
    pub fn reset(&mut self) {
        self.rows.clear();
        self.columns.clear();
        self.filters.clear();
        self.page = 0;
        self.loading = true;
    }

    pub fn load(&mut self, columns: Vec<String>, rows: Vec<ResultRow>) {
        self.columns = columns;
        self.rows = rows.into_iter().map(TableRow::new).collect();
        self.page = 0;
        self.loading = false;
    }

    /// Leave the loading state without rows, e.g. after a failed request.
    pub fn finish_loading(&mut self) {
        self.loading = false;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&TableRow> {
        self.rows.get(index)
    }

    pub fn row_log_mut(&mut self, index: usize) -> Option<&mut LogBlock> {
        self.rows.get_mut(index).map(|r| &mut r.log)
    }

    /// Configured visible columns first in their fixed order, then the rest
    /// in backend order.
    pub fn ordered_columns(&self) -> Vec<&str> {
        let mut ordered: Vec<&str> = self
            .default_visible
            .iter()
            .filter(|c| self.columns.contains(c))
            .map(String::as_str)
            .collect();
        ordered.extend(
            self.columns
                .iter()
                .filter(|c| !self.default_visible.contains(c))
                .map(String::as_str),
        );
        ordered
    }

    pub fn is_column_visible(&self, column: &str) -> bool {
        self.visibility
            .get(column)
            .copied()
            .unwrap_or_else(|| self.default_visible.iter().any(|c| c == column))
    }

    /// Columns shown in the main row. `loglines` only appears in details.
    pub fn shown_columns(&self) -> Vec<&str> {
        self.ordered_columns()
            .into_iter()
            .filter(|c| *c != LOGLINES_COLUMN && self.is_column_visible(c))
            .collect()
    }

    pub fn set_column_visible(&mut self, column: &str, visible: bool) -> bool {
        if !self.columns.iter().any(|c| c == column) {
            return false;
        }
        self.visibility.insert(column.to_string(), visible);
        true
    }

    pub fn toggle_row(&mut self, index: usize) -> Option<bool> {
        let row = self.rows.get_mut(index)?;
        row.expanded = !row.expanded;
        Some(row.expanded)
    }

    pub fn toggle_empty_fields(&mut self, index: usize) -> Option<bool> {
        let row = self.rows.get_mut(index)?;
        row.show_empty = !row.show_empty;
        Some(row.show_empty)
    }

    /// Push the inactive tags into the `tags` column filter.
    pub fn apply_tag_filter(&mut self, tags: &TagFilter) {
        match ColumnFilter::from_tags(tags) {
            Some(filter) => {
                self.filters.insert(TAGS_COLUMN.to_string(), filter);
            }
            None => {
                self.filters.remove(TAGS_COLUMN);
            }
        }
        self.page = 0;
    }

    pub fn column_filter(&self, column: &str) -> Option<&str> {
        self.filters.get(column).map(|f| f.expression.as_str())
    }

    /// Indices of rows that pass every column filter.
    pub fn filtered_rows(&self) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| {
                self.filters
                    .iter()
                    .all(|(column, filter)| filter.matches(row.cell(column)))
            })
            .map(|(i, _)| i)
            .collect()
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_count(&self) -> usize {
        self.filtered_rows().len().div_ceil(self.page_size).max(1)
    }

    /// Move to `page`, clamped to the last page.
    pub fn set_page(&mut self, page: usize) -> usize {
        self.page = page.min(self.page_count() - 1);
        self.page
    }

    pub fn page_rows(&self) -> Vec<usize> {
        self.filtered_rows()
            .into_iter()
            .skip(self.page * self.page_size)
            .take(self.page_size)
            .collect()
    }

    pub fn render(&self) -> String {
        if self.loading {
            return "<div class=\"loading\">Loading...</div>".to_string();
        }

        let shown = self.shown_columns();
        let mut html = String::from("<table id=\"result-table\" class=\"table\"><thead><tr><th class=\"toggle\"></th>");
        for column in &shown {
            html.push_str(&format!(
                "<th data-column=\"{}\">{}</th>",
                escape(column),
                escape(column)
            ));
        }
        html.push_str("</tr></thead><tbody>");

        for index in self.page_rows() {
            let row = &self.rows[index];
            self.render_row(&mut html, index, row, &shown);
            self.render_details(&mut html, index, row, shown.len() + 1);
        }

        html.push_str("</tbody></table>");
        html.push_str(&self.render_pager());
        html
    }

    fn render_row(&self, html: &mut String, index: usize, row: &TableRow, shown: &[&str]) {
        html.push_str(&format!(
            "<tr class=\"result-row{}\" data-row=\"{}\"><td class=\"toggle\">{}</td>",
            if row.expanded { " expanded" } else { "" },
            index,
            if row.expanded { "-" } else { "+" }
        ));
        for column in shown {
            let (class, text) = match row.cell(column) {
                Some(value) => (danger_class(column, value), escape(&display_value(value))),
                None => ("", String::new()),
            };
            html.push_str(&format!("<td{}>{}</td>", class, text));
        }
        html.push_str("</tr>");
    }

    fn render_details(&self, html: &mut String, index: usize, row: &TableRow, colspan: usize) {
        html.push_str(&format!(
            "<tr class=\"detail-row{}\" data-row=\"{}\"><td colspan=\"{}\">",
            if row.expanded { "" } else { " hidden" },
            index,
            colspan
        ));
        html.push_str(&format!(
            "<button class=\"empty-toggle\" data-row=\"{}\">{}</button><dl class=\"details\">",
            index,
            if row.show_empty {
                "Hide empty fields"
            } else {
                "Show empty fields"
            }
        ));

        for column in self.ordered_columns() {
            if column == LOGLINES_COLUMN {
                continue;
            }
            let value = row.cell(column);
            let blank = is_blank(value);
            html.push_str(&format!(
                "<div class=\"pair{}\"><dt>{}</dt><dd{}>",
                match (blank, row.show_empty) {
                    (true, true) => " empty",
                    (true, false) => " empty hidden",
                    _ => "",
                },
                escape(column),
                value.map_or("", |v| danger_class(column, v))
            ));
            let tokens: Vec<String> = value
                .map(value_parts)
                .unwrap_or_default()
                .iter()
                .map(|part| {
                    format!(
                        "<span class=\"token{}\" data-row=\"{}\" data-token=\"{}\">{}</span>",
                        if row.log.is_highlighted(part) {
                            " highlighted"
                        } else {
                            ""
                        },
                        index,
                        escape(part),
                        escape(part)
                    )
                })
                .collect();
            html.push_str(&tokens.join(", "));
            html.push_str("</dd></div>");
        }

        html.push_str(&format!(
            "</dl><pre class=\"loglines\" data-row=\"{}\">{}</pre></td></tr>",
            index,
            row.log.markup()
        ));
    }

    fn render_pager(&self) -> String {
        let count = self.page_count();
        let mut html = String::from("<div class=\"pager\">");
        for page in 0..count {
            html.push_str(&format!(
                "<button class=\"page{}\" data-page=\"{}\">{}</button>",
                if page == self.page { " current" } else { "" },
                page,
                page + 1
            ));
        }
        html.push_str("</div>");
        html
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

fn danger_class(column: &str, value: &Value) -> &'static str {
    if is_danger(column, value) {
        " class=\"danger\""
    } else {
        ""
    }
}
