//! Error types for ticket rendering and QR encoding

use thiserror::Error;

/// Template rendering failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// Template references a token absent from the transaction fields
    #[error("template references unknown field: {0}")]
    MissingField(String),

    /// Token delimiters are unbalanced
    #[error("template has unbalanced token delimiters")]
    MalformedTemplate,
}

/// Result type for template rendering
pub type RenderResult<T> = Result<T, RenderError>;

/// QR payload encoding failures
#[derive(Debug, Error)]
pub enum QrError {
    /// A mandatory fiscal field is missing or empty
    #[error("QR payload is missing mandatory field: {0}")]
    IncompleteFields(&'static str),

    /// Payload could not be serialized to JSON
    #[error("QR payload serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for QR payload operations
pub type QrResult<T> = Result<T, QrError>;
