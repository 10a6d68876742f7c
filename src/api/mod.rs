//! Client side of the Tamandua REST API.

pub mod cache;
pub mod error;
pub mod http;

pub use cache::CachedBackend;
pub use error::ApiError;
pub use http::HttpBackend;

use crate::expression::SearchExpression;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One result row: column name to scalar or array value.
pub type ResultRow = Map<String, Value>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub rows: Vec<ResultRow>,
    pub total_rows: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountItem {
    pub key: String,
    pub value: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvCountResponse {
    pub total: u64,
    pub items: Vec<CountItem>,
}

/// Operations the UI needs from the backend.
///
/// Implementations must be shareable across threads: dashboard queries run
/// in parallel.
pub trait Backend: Send + Sync {
    /// All column names. Empty or malformed lists are `InvalidData`.
    fn columns(&self) -> Result<Vec<String>, ApiError>;

    fn tags(&self) -> Result<Vec<String>, ApiError>;

    /// One page of search results.
    fn search(
        &self,
        expression: &SearchExpression,
        page: usize,
        size: usize,
    ) -> Result<SearchResponse, ApiError>;

    fn count(&self, query: &SearchExpression) -> Result<u64, ApiError>;

    /// Top-`limit` breakdown of `query.advcount`.
    fn adv_count(&self, query: &SearchExpression, limit: usize)
        -> Result<AdvCountResponse, ApiError>;

    /// Distinct values of a column, at most `max_choices`.
    fn field_choices(&self, column: &str, max_choices: usize) -> Result<Vec<String>, ApiError>;

    /// Columns the backend can enumerate choices for.
    fn supported_field_choices(&self) -> Result<Vec<String>, ApiError>;
}

/// Decode a JSON body that must be an array of strings.
pub(crate) fn parse_string_list(value: Value, what: &str) -> Result<Vec<String>, ApiError> {
    let Value::Array(items) = value else {
        return Err(ApiError::invalid_data(format!("{} is not an array", what)));
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::String(s) => Ok(s),
            other => Err(ApiError::invalid_data(format!(
                "{} contains a non-string entry: {}",
                what, other
            ))),
        })
        .collect()
}

/// Display text of a row value: arrays joined, `null` as empty.
pub fn display_value(value: &Value) -> String {
    value_parts(value).join(", ")
}

/// Individual scalar pieces of a row value.
pub fn value_parts(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items.iter().flat_map(value_parts).collect(),
        other => vec![other.to_string()],
    }
}
