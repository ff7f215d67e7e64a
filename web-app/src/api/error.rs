use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Your session has expired. Please log in again.")]
    Unauthorized,
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("Could not reach the backend: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("The backend answered with an unexpected payload: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Classifies a non-2xx response.
    pub fn from_response(status: u16, body: &str) -> Self {
        match status {
            401 | 419 => ApiError::Unauthorized,
            _ => ApiError::Rejected {
                status,
                message: rejection_message(status, body),
            },
        }
    }
}

/// Builds the human readable message for a failed call.
///
/// Field validation errors become one `field: message, message` line per
/// field. Failing that the backend's own message is used, then the raw body.
pub fn rejection_message(status: u16, body: &str) -> String {
    if let Ok(Value::Object(payload)) = serde_json::from_str::<Value>(body) {
        if let Some(Value::Object(errors)) = payload.get("errors") {
            if let Some(message) = flatten_field_errors(errors) {
                return message;
            }
        }
        for key in ["message", "error"] {
            if let Some(Value::String(message)) = payload.get(key) {
                if !message.trim().is_empty() {
                    return message.trim().to_string();
                }
            }
        }
        if let Some(message) = flatten_field_errors(&payload) {
            return message;
        }
    }

    let text = body.trim();
    if text.is_empty() {
        format!("Request failed with status {status}")
    } else {
        text.to_string()
    }
}

fn flatten_field_errors(errors: &Map<String, Value>) -> Option<String> {
    let mut lines = Vec::with_capacity(errors.len());
    for (field, messages) in errors {
        let joined = match messages {
            Value::String(message) => message.clone(),
            Value::Array(messages) => {
                let messages: Option<Vec<&str>> = messages.iter().map(Value::as_str).collect();
                messages?.join(", ")
            }
            _ => return None,
        };
        lines.push(format!("{field}: {joined}"));
    }

    (!lines.is_empty()).then(|| lines.join("\n"))
}
