//! Backend error types.
//!
//! Every failed request is normalized into one of three kinds so the UI can
//! show a single dismissable message regardless of where it failed.

use serde::Deserialize;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Network failure or an HTTP error without a structured body.
    Transport {
        status: Option<u16>,
        status_text: String,
    },

    /// Structured error reported by the server; the message is shown verbatim.
    Server { message: String },

    /// The response parsed, but not into the shape the endpoint promises.
    InvalidData { detail: String },
}

impl ApiError {
    pub fn invalid_data(detail: impl Into<String>) -> Self {
        ApiError::InvalidData {
            detail: detail.into(),
        }
    }

    /// Build the error for a non-success response.
    ///
    /// A `{message}` or legacy `{exception: {type, message}}` body wins over
    /// the status text.
    pub fn from_response(status: u16, status_text: &str, body: &str) -> Self {
        if let Ok(value) = serde_json::from_str::<Value>(body) {
            if let Some(err) = server_error_in(&value) {
                return err;
            }
        }
        ApiError::Transport {
            status: Some(status),
            status_text: if status_text.is_empty() {
                format!("HTTP {}", status)
            } else {
                status_text.to_string()
            },
        }
    }

    /// Message for the UI message panel.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Transport { status_text, .. } => {
                format!("Failed to get data from server: {}", status_text)
            }
            ApiError::Server { message } => {
                format!("An error on the server occurred: {}", message)
            }
            ApiError::InvalidData { .. } => "Received invalid data from the server.".to_string(),
        }
    }
}

#[derive(Deserialize)]
struct LegacyException {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    message: String,
}

/// Detect a structured error inside an otherwise successful body.
///
/// Older backends answer `200 OK` with `{exception: {type, message}}`.
pub fn server_error_in(value: &Value) -> Option<ApiError> {
    let obj = value.as_object()?;

    if let Some(exception) = obj.get("exception") {
        let exception: LegacyException = serde_json::from_value(exception.clone()).ok()?;
        let message = match exception.kind {
            Some(kind) if !kind.is_empty() => format!("{}: {}", kind, exception.message),
            _ => exception.message,
        };
        return Some(ApiError::Server { message });
    }

    obj.get("message")
        .and_then(Value::as_str)
        .map(|message| ApiError::Server {
            message: message.to_string(),
        })
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Transport {
                status: Some(status),
                status_text,
            } => write!(f, "request failed ({}): {}", status, status_text),
            ApiError::Transport {
                status: None,
                status_text,
            } => write!(f, "request failed: {}", status_text),
            ApiError::Server { message } => write!(f, "server error: {}", message),
            ApiError::InvalidData { detail } => write!(f, "received invalid data: {}", detail),
        }
    }
}

impl std::error::Error for ApiError {}
