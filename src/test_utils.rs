use crate::api::{AdvCountResponse, ApiError, Backend, ResultRow, SearchResponse};
use crate::expression::SearchExpression;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory backend for tests. Returns canned responses and records calls.
pub struct MockBackend {
    pub columns: Vec<String>,
    pub tags: Vec<String>,
    pub search_response: SearchResponse,
    /// Count keyed by [`count_key`] of the query.
    pub counts: HashMap<String, u64>,
    /// Top-N response per group-by field.
    pub adv_counts: HashMap<String, AdvCountResponse>,
    pub choices: HashMap<String, Vec<String>>,
    pub supported: Vec<String>,
    calls: Mutex<HashMap<&'static str, usize>>,
    failures: Mutex<HashMap<&'static str, ApiError>>,
    searches: Mutex<Vec<SearchExpression>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            columns: ["phdmxin_time", "sender", "recipient", "spamscore", "tags", "loglines"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            tags: vec!["spam".into(), "incoming".into(), "greylisted".into()],
            search_response: SearchResponse::default(),
            counts: HashMap::new(),
            adv_counts: HashMap::new(),
            choices: HashMap::new(),
            supported: Vec::new(),
            calls: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
            searches: Mutex::new(Vec::new()),
        }
    }

    pub fn with_rows(mut self, rows: Vec<Value>, total_rows: u64) -> Self {
        self.search_response = SearchResponse {
            rows: rows.into_iter().map(row).collect(),
            total_rows,
        };
        self
    }

    /// Make the next call of `operation` fail with `err`.
    pub fn fail_next(&self, operation: &'static str, err: ApiError) {
        self.failures.lock().unwrap().insert(operation, err);
    }

    pub fn calls(&self, operation: &str) -> usize {
        self.calls.lock().unwrap().get(operation).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    pub fn searches(&self) -> Vec<SearchExpression> {
        self.searches.lock().unwrap().clone()
    }

    fn record(&self, operation: &'static str) -> Result<(), ApiError> {
        *self.calls.lock().unwrap().entry(operation).or_insert(0) += 1;
        match self.failures.lock().unwrap().remove(operation) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// `"field:value"` of the first condition, or `""` for an unfiltered query.
pub fn count_key(query: &SearchExpression) -> String {
    query
        .fields
        .first()
        .map(|f| format!("{}:{}", f.field, f.condition.value))
        .unwrap_or_default()
}

/// Convert a `json!({...})` object into a result row.
pub fn row(value: Value) -> ResultRow {
    match value {
        Value::Object(map) => map,
        other => panic!("row must be a JSON object, got {}", other),
    }
}

impl Backend for MockBackend {
    fn columns(&self) -> Result<Vec<String>, ApiError> {
        self.record("columns")?;
        Ok(self.columns.clone())
    }

    fn tags(&self) -> Result<Vec<String>, ApiError> {
        self.record("tags")?;
        Ok(self.tags.clone())
    }

    fn search(
        &self,
        expression: &SearchExpression,
        _page: usize,
        _size: usize,
    ) -> Result<SearchResponse, ApiError> {
        self.record("search")?;
        self.searches.lock().unwrap().push(expression.clone());
        Ok(self.search_response.clone())
    }

    fn count(&self, query: &SearchExpression) -> Result<u64, ApiError> {
        self.record("count")?;
        Ok(self.counts.get(&count_key(query)).copied().unwrap_or(0))
    }

    fn adv_count(
        &self,
        query: &SearchExpression,
        _limit: usize,
    ) -> Result<AdvCountResponse, ApiError> {
        self.record("adv_count")?;
        let key = query
            .advcount
            .as_ref()
            .map(|a| a.field.as_str())
            .unwrap_or_default();
        Ok(self.adv_counts.get(key).cloned().unwrap_or_default())
    }

    fn field_choices(&self, column: &str, _max_choices: usize) -> Result<Vec<String>, ApiError> {
        self.record("field_choices")?;
        Ok(self.choices.get(column).cloned().unwrap_or_default())
    }

    fn supported_field_choices(&self) -> Result<Vec<String>, ApiError> {
        self.record("supported_field_choices")?;
        Ok(self.supported.clone())
    }
}
