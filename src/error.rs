use serde_json::{Value, json};

/// The single failure kind returned across the client boundary.
///
/// Connection errors, unreadable bodies, non-JSON responses, and non-2xx
/// statuses all collapse into this value; `message` carries the error text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct Failure {
    pub message: String,
}

/// Outcome of every client operation.
pub type ApiResult<T = Value> = Result<T, Failure>;

impl Failure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The `{"status": "error", "message": ...}` envelope the service itself uses for errors.
    pub fn to_envelope(&self) -> Value {
        json!({ "status": "error", "message": self.message })
    }
}

impl From<anyhow::Error> for Failure {
    fn from(err: anyhow::Error) -> Self {
        // Alternate formatting keeps the whole context chain, e.g.
        // "GET http://.../health failed: error sending request ...: connection refused".
        Self::new(format!("{err:#}"))
    }
}
