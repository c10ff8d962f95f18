//! Contract violations raised by the conversion entry points.
//!
//! Malformed content never surfaces here; it is repaired and reported as a
//! [`Diagnostic`](crate::Diagnostic) instead.

/// Errors signalling invalid usage of the converters
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("Expected a JSON array of blocks, got {found}")]
    NotAnArray { found: &'static str },

    #[error("Document root must be a `doc` node, got `{found}`")]
    InvalidRoot { found: String },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConvertError>;

/// Human-readable name of a JSON value's kind, for error messages
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
