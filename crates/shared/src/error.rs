use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error body returned by the backend on non-2xx responses.
///
/// `detail` is a plain string for handler errors and a list of field errors
/// for request validation failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendErrorBody {
    pub detail: Value,
}

impl BackendErrorBody {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: Value::String(detail.into()),
        }
    }

    pub fn message(&self) -> String {
        match &self.detail {
            Value::String(text) => text.clone(),
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.get("msg")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| item.to_string())
                })
                .collect::<Vec<_>>()
                .join("; "),
            other => other.to_string(),
        }
    }
}
