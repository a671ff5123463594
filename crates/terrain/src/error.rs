// ---------------------------------------------------------------------------
// Error types for the generation pipeline
// ---------------------------------------------------------------------------

use thiserror::Error;

/// A message that could not be accepted at a channel boundary.
///
/// Always non-fatal: the receiver logs it and drops the message, and the
/// channel stays usable.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The bytes did not decode to any known message.
    #[error("malformed message: {0}")]
    Malformed(String),
    /// A well-formed message arrived on the side that never handles it.
    #[error("unexpected command '{command}'")]
    Unexpected { command: &'static str },
    /// A reply arrived with no request outstanding.
    #[error("unsolicited '{command}' reply")]
    Unsolicited { command: &'static str },
    /// The message decoded but its payload is inconsistent.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

impl From<bitcode::Error> for ProtocolError {
    fn from(e: bitcode::Error) -> Self {
        ProtocolError::Malformed(e.to_string())
    }
}

/// Sample maps that cannot back a field.
#[derive(Debug, Error, PartialEq)]
pub enum FieldError {
    #[error("expected a {expected} sample map, got {found}")]
    WrongShape {
        expected: &'static str,
        found: &'static str,
    },
    #[error("sample map is empty")]
    Empty,
    #[error("sample map holds {found} values, expected {expected}")]
    LengthMismatch { expected: usize, found: usize },
}

/// Errors raised by the generation worker or its handle.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// A generate request arrived before any init.
    #[error("generate requested before init")]
    NotInitialized,
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("cannot build fields: {0}")]
    Field(#[from] FieldError),
    /// Generated geometry failed validation; the cycle is abandoned.
    #[error("generated mesh is invalid: {0}")]
    InvalidMesh(String),
    /// The worker thread is gone; nothing more will be serviced.
    #[error("worker channel disconnected")]
    Disconnected,
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

impl WorkerError {
    /// Whether the worker must stop servicing requests after this error.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, WorkerError::Protocol(_) | WorkerError::Field(_))
    }
}

/// Errors loading a `StreamingConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}
