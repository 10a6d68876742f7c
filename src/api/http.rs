//! Blocking HTTP implementation of [`Backend`].

use super::error::server_error_in;
use super::{parse_string_list, AdvCountResponse, ApiError, Backend, SearchResponse};
use crate::expression::SearchExpression;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

pub struct HttpBackend {
    client: Client,
    base: Url,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base = Url::parse(base_url).map_err(|e| ApiError::Transport {
            status: None,
            status_text: format!("invalid backend url '{}': {}", base_url, e),
        })?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(transport_error)?;
        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &str {
        self.base.as_str()
    }

    /// `{base}/api/{segments...}` with each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Transport {
                status: None,
                status_text: format!("backend url '{}' cannot be a base", self.base),
            })?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    fn get(&self, segments: &[&str]) -> Result<Value, ApiError> {
        let url = self.endpoint(segments)?;
        tracing::debug!(%url, "GET");
        self.execute(self.client.get(url))
    }

    fn post<T: Serialize>(&self, segments: &[&str], body: &T) -> Result<Value, ApiError> {
        let url = self.endpoint(segments)?;
        tracing::debug!(%url, "POST");
        self.execute(self.client.post(url).json(body))
    }

    fn execute(&self, request: RequestBuilder) -> Result<Value, ApiError> {
        let response = request.send().map_err(transport_error)?;
        let status = response.status();
        let body = response.text().map_err(transport_error)?;

        if !status.is_success() {
            let err = ApiError::from_response(
                status.as_u16(),
                status.canonical_reason().unwrap_or_default(),
                &body,
            );
            tracing::warn!(status = status.as_u16(), error = %err, "backend request failed");
            return Err(err);
        }

        let value: Value = serde_json::from_str(&body)
            .map_err(|e| ApiError::invalid_data(format!("response is not JSON: {}", e)))?;

        if value.get("exception").is_some() {
            if let Some(err) = server_error_in(&value) {
                tracing::warn!(error = %err, "backend reported an exception");
                return Err(err);
            }
        }

        Ok(value)
    }
}

fn transport_error(err: reqwest::Error) -> ApiError {
    ApiError::Transport {
        status: err.status().map(|s| s.as_u16()),
        status_text: err.to_string(),
    }
}

fn decode<T: DeserializeOwned>(value: Value, what: &str) -> Result<T, ApiError> {
    serde_json::from_value(value)
        .map_err(|e| ApiError::invalid_data(format!("unexpected {} payload: {}", what, e)))
}

impl Backend for HttpBackend {
    fn columns(&self) -> Result<Vec<String>, ApiError> {
        let columns = parse_string_list(self.get(&["columns"])?, "columns")?;
        if columns.is_empty() {
            return Err(ApiError::invalid_data("column list is empty"));
        }
        Ok(columns)
    }

    fn tags(&self) -> Result<Vec<String>, ApiError> {
        parse_string_list(self.get(&["tags"])?, "tags")
    }

    fn search(
        &self,
        expression: &SearchExpression,
        page: usize,
        size: usize,
    ) -> Result<SearchResponse, ApiError> {
        let page = page.to_string();
        let size = size.to_string();
        decode(self.post(&["search", &page, &size], expression)?, "search")
    }

    fn count(&self, query: &SearchExpression) -> Result<u64, ApiError> {
        decode(self.post(&["count"], query)?, "count")
    }

    fn adv_count(
        &self,
        query: &SearchExpression,
        limit: usize,
    ) -> Result<AdvCountResponse, ApiError> {
        if query.advcount.is_none() {
            return Err(ApiError::invalid_data("advcount query without a group-by field"));
        }
        let limit = limit.to_string();
        decode(self.post(&["advcount", &limit], query)?, "advcount")
    }

    fn field_choices(&self, column: &str, max_choices: usize) -> Result<Vec<String>, ApiError> {
        let max = max_choices.to_string();
        parse_string_list(self.get(&["fieldchoices", column, &max])?, "field choices")
    }

    fn supported_field_choices(&self) -> Result<Vec<String>, ApiError> {
        parse_string_list(self.get(&["supported_fieldchoices"])?, "supported field choices")
    }
}
