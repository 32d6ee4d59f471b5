use std::fmt;

use thiserror::Error;

/// Top-level error type for courier infrastructure.
///
/// Covers configuration, persistence and serialization. Backend failures
/// live in the subsystem crates and are classified with [`ErrorKind`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CourierError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Session error: {0}")]
    Session(String),
}

impl From<toml::de::Error> for CourierError {
    fn from(err: toml::de::Error) -> Self {
        CourierError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for CourierError {
    fn from(err: toml::ser::Error) -> Self {
        CourierError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for CourierError {
    fn from(err: serde_json::Error) -> Self {
        CourierError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for courier infrastructure operations.
pub type Result<T> = std::result::Result<T, CourierError>;

/// Classification of every failure a single message exchange can end in.
///
/// Subsystem errors expose a `kind()` accessor so callers can branch on the
/// class of failure without matching on crate-specific variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No response was received (DNS, connect, timeout).
    Unreachable,
    /// Unexpected HTTP status; carries the numeric code.
    ProtocolError(u16),
    /// HTTP 404 from the workflow endpoint.
    EndpointNotFound,
    /// HTTP 403 from the workflow endpoint.
    AccessDenied,
    /// HTTP 500 from the workflow endpoint.
    BackendInternalError,
    /// 2xx with a blank body.
    EmptyResponse,
    /// 2xx with a body that is not valid JSON.
    MalformedResponse,
    /// A function call from the AI backend is missing required fields.
    InvalidFunctionArgs,
    /// Generic failure from the generative model.
    AiBackendError,
    /// The backend has no endpoint or credential configured.
    NotConfigured,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Unreachable => write!(f, "unreachable"),
            ErrorKind::ProtocolError(status) => write!(f, "protocol_error({})", status),
            ErrorKind::EndpointNotFound => write!(f, "endpoint_not_found"),
            ErrorKind::AccessDenied => write!(f, "access_denied"),
            ErrorKind::BackendInternalError => write!(f, "backend_internal_error"),
            ErrorKind::EmptyResponse => write!(f, "empty_response"),
            ErrorKind::MalformedResponse => write!(f, "malformed_response"),
            ErrorKind::InvalidFunctionArgs => write!(f, "invalid_function_args"),
            ErrorKind::AiBackendError => write!(f, "ai_backend_error"),
            ErrorKind::NotConfigured => write!(f, "not_configured"),
        }
    }
}
