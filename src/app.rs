//! Page-lifetime state and the search and drill-down flows.

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::api::{ApiError, Backend};
use crate::config::Config;
use crate::dashboard::{render as dashboard_render, Dashboard, DashboardSnapshot};
use crate::expression::{
    BuildError, Comparator, DateTimeRange, ExpressionBuilder, ExpressionLine, LineId,
};
use crate::highlight::{HighlightOutcome, Highlighter};
use crate::render::{MessagePanel, ResultTable, TagFilter};

/// Field a freshly added expression line starts with.
pub const DEFAULT_FIELD: &str = "sender";

pub const NO_RESULTS_MESSAGE: &str = "The search returned no results.";

/// Which view the page shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Search,
    Dashboard,
}

/// How a search ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Validation failed; nothing was sent.
    Rejected(BuildError),
    /// A backend request failed.
    Failed(ApiError),
    NoResults,
    Loaded {
        rows: usize,
        total_rows: u64,
        truncated: bool,
    },
}

/// Owns everything the page shows: builder, fetched columns, result table,
/// highlighter, messages, tag filter and dashboard.
pub struct Controller {
    backend: Arc<dyn Backend>,
    config: Config,
    view: View,
    builder: ExpressionBuilder,
    range: DateTimeRange,
    columns: Vec<String>,
    table: ResultTable,
    tags: TagFilter,
    messages: MessagePanel,
    highlighter: Highlighter,
    dashboard: Dashboard,
    supported_choices: Option<Vec<String>>,
}

impl Controller {
    pub fn new(backend: Arc<dyn Backend>, config: Config) -> Self {
        Self {
            builder: ExpressionBuilder::new(DEFAULT_FIELD),
            table: ResultTable::new(config.visible_columns.clone(), config.table_page_size),
            dashboard: Dashboard::new(config.dashboard_lookback_hours, config.dashboard_top_n),
            backend,
            config,
            view: View::Search,
            range: DateTimeRange::default(),
            columns: Vec::new(),
            tags: TagFilter::default(),
            messages: MessagePanel::new(),
            highlighter: Highlighter::new(),
            supported_choices: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn set_view(&mut self, view: View) {
        self.view = view;
    }

    pub fn builder(&self) -> &ExpressionBuilder {
        &self.builder
    }

    pub fn range(&self) -> DateTimeRange {
        self.range
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn table(&self) -> &ResultTable {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut ResultTable {
        &mut self.table
    }

    pub fn tags(&self) -> &TagFilter {
        &self.tags
    }

    pub fn messages(&self) -> &MessagePanel {
        &self.messages
    }

    pub fn messages_mut(&mut self) -> &mut MessagePanel {
        &mut self.messages
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    /// Fetch the tag list for the tag buttons.
    pub fn load_tags(&mut self) -> bool {
        match self.backend.tags() {
            Ok(tags) => {
                debug!(count = tags.len(), "Loaded tags");
                self.tags = TagFilter::new(tags);
                self.table.apply_tag_filter(&self.tags);
                true
            }
            Err(err) => {
                warn!(error = %err, "Failed to load tags");
                self.messages.error(err.user_message());
                false
            }
        }
    }

    /// Fetch column names for the field selectors.
    pub fn load_columns(&mut self) -> bool {
        match self.backend.columns() {
            Ok(columns) => {
                self.columns = columns;
                true
            }
            Err(err) => {
                warn!(error = %err, "Failed to load columns");
                self.messages
                    .error(ApiError::invalid_data(err.to_string()).user_message());
                false
            }
        }
    }

    pub fn add_line(&mut self) -> Option<LineId> {
        self.builder.add_line()
    }

    /// Append a filled line, bypassing the empty-line check.
    pub fn push_line(&mut self, field: &str, comparator: Comparator, value: &str) -> LineId {
        self.builder.push_line(field, comparator, value)
    }

    pub fn remove_line(&mut self, id: LineId) -> bool {
        self.builder.remove_line(id)
    }

    pub fn cycle_comparator(&mut self, id: LineId) -> Option<Comparator> {
        self.builder.cycle_comparator(id)
    }

    pub fn set_comparator(&mut self, id: LineId, comparator: Comparator) -> bool {
        self.builder.set_comparator(id, comparator)
    }

    pub fn set_value(&mut self, id: LineId, value: &str) -> bool {
        self.builder.set_value(id, value)
    }

    /// Change a line's field. Columns with few distinct values switch the
    /// line to a choice selector.
    pub fn set_field(&mut self, id: LineId, field: &str) -> bool {
        if !self.builder.set_field(id, field) {
            return false;
        }
        if let Some(options) = self.lookup_choices(field) {
            self.builder.set_choices(id, options);
        }
        true
    }

    fn lookup_choices(&mut self, field: &str) -> Option<Vec<String>> {
        if self.supported_choices.is_none() {
            match self.backend.supported_field_choices() {
                Ok(list) => self.supported_choices = Some(list),
                Err(err) => {
                    debug!(error = %err, "Field choices unavailable");
                    return None;
                }
            }
        }
        if !self.supported_choices.as_ref()?.iter().any(|f| f == field) {
            return None;
        }

        let threshold = self.config.field_choices_threshold;
        match self.backend.field_choices(field, threshold) {
            Ok(options) if !options.is_empty() && options.len() < threshold => Some(options),
            Ok(_) => None,
            Err(err) => {
                debug!(field, error = %err, "Field choices lookup failed");
                None
            }
        }
    }

    pub fn lines(&self) -> &[ExpressionLine] {
        self.builder.lines()
    }

    /// Validate the builder, fetch columns, then rows, and load the table.
    pub fn search(&mut self, range: DateTimeRange) -> SearchOutcome {
        self.range = range;
        self.view = View::Search;

        let expression = match self.builder.build(range) {
            Ok(expression) => expression,
            Err(err) => {
                self.messages.error(err.to_string());
                return SearchOutcome::Rejected(err);
            }
        };

        self.messages.clear();

        let columns = match self.backend.columns() {
            Ok(columns) => columns,
            Err(err) => {
                warn!(error = %err, "Column fetch failed");
                let err = ApiError::invalid_data(err.to_string());
                self.messages.error(err.user_message());
                return SearchOutcome::Failed(err);
            }
        };
        self.columns = columns.clone();
        self.table.reset();

        let page_size = self.config.page_size;
        info!(fields = expression.fields.len(), "Running search");
        let response = match self.backend.search(&expression, 0, page_size) {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "Search failed");
                self.table.finish_loading();
                self.messages.error(err.user_message());
                return SearchOutcome::Failed(err);
            }
        };

        let rows = response.rows.len();
        let total_rows = response.total_rows;
        self.table.load(columns, response.rows);
        self.table.apply_tag_filter(&self.tags);

        if rows == 0 {
            self.messages.info(NO_RESULTS_MESSAGE);
            return SearchOutcome::NoResults;
        }

        let truncated = total_rows > page_size as u64;
        if truncated {
            self.messages.warn(format!(
                "Too many results ({}), showing first {}.",
                total_rows, page_size
            ));
        }

        debug!(rows, total_rows, "Search loaded");
        SearchOutcome::Loaded {
            rows,
            total_rows,
            truncated,
        }
    }

    pub fn toggle_tag(&mut self, tag: &str) -> Option<bool> {
        let active = self.tags.toggle(tag)?;
        self.table.apply_tag_filter(&self.tags);
        Some(active)
    }

    /// Toggle a highlight in the log block of `row`.
    pub fn highlight(&mut self, row: usize, token: &str) -> Option<HighlightOutcome> {
        let block = self.table.row_log_mut(row)?;
        Some(self.highlighter.toggle(block, token))
    }

    pub fn refresh_dashboard(&mut self, now: NaiveDateTime) -> &DashboardSnapshot {
        self.dashboard.refresh(self.backend.as_ref(), now)
    }

    /// Refresh if the snapshot is older than the configured interval.
    pub fn refresh_dashboard_if_stale(&mut self, now: NaiveDateTime) -> bool {
        let interval = std::time::Duration::from_secs(self.config.dashboard_refresh_secs);
        if !self.dashboard.needs_refresh(interval) {
            return false;
        }
        self.refresh_dashboard(now);
        true
    }

    /// Change the lookback window and re-run every dashboard query.
    pub fn set_lookback(&mut self, hours: u32, now: NaiveDateTime) {
        if self.dashboard.set_lookback(hours) {
            self.refresh_dashboard(now);
        }
    }

    pub fn dashboard_html(&self) -> String {
        match self.dashboard.snapshot() {
            Some(snapshot) => dashboard_render::render_html(self.dashboard.items(), snapshot),
            None => "<div class=\"dashboard loading\">Loading...</div>".to_string(),
        }
    }

    /// Rebuild the builder from a top-N entry and search over the lookback
    /// window.
    pub fn drill_down(
        &mut self,
        item: &str,
        entry: &str,
        now: NaiveDateTime,
    ) -> Option<SearchOutcome> {
        let drill = self.dashboard.drill_down(item, entry, now)?;
        info!(item, entry, "Dashboard drill-down");

        self.builder.clear();
        for field in drill.fields {
            self.builder
                .push_line(field.field, field.condition.comparator, field.condition.value);
        }
        Some(self.search(drill.range))
    }
}
