//! Protocol error types

use thiserror::Error;

/// Errors that corrupt the frame stream.
///
/// None of these can be recovered from: once a header or payload is cut
/// short there is no way to find the start of the next frame.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Stream ended inside a length header
    #[error("Invalid message length header: {actual} bytes")]
    IncompleteHeader { actual: usize },

    /// Stream ended inside a payload
    #[error("Incomplete frame: expected {expected} bytes, got {actual}")]
    IncompleteFrame { expected: usize, actual: usize },

    /// Payload exceeds maximum size
    #[error("Payload too large: {size} bytes exceeds maximum of {max} bytes")]
    PayloadTooLarge { size: usize, max: usize },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors in a well-framed request that the relay answers with an error
/// response instead of terminating.
#[derive(Error, Debug)]
pub enum RequestError {
    /// Payload is not a JSON object of the expected shape
    #[error("Invalid request: {0}")]
    Malformed(#[from] serde_json::Error),

    /// No `action` field
    #[error("Missing action")]
    MissingAction,

    /// Action name not in the action table
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    /// One or more required fields absent or empty
    #[error("Missing {0}")]
    MissingFields(&'static str),

    /// Field present but unusable
    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}
