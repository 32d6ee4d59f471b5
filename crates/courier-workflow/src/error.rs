//! Error types for the workflow client.

use courier_core::ErrorKind;

/// Failures of a single workflow call.
///
/// Every variant carries enough text to be shown to the user as-is.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Cannot reach the workflow service: {0}")]
    Unreachable(String),
    #[error("Workflow endpoint not found: {0}")]
    EndpointNotFound(String),
    #[error("Access to the workflow endpoint was denied: {0}")]
    AccessDenied(String),
    #[error("The workflow service hit an internal error: {0}")]
    BackendInternalError(String),
    #[error("Workflow request failed with HTTP {status}: {message}")]
    ProtocolError { status: u16, message: String },
    #[error("The workflow service returned an empty response")]
    EmptyResponse,
    #[error("The workflow service returned invalid JSON: {0}")]
    MalformedResponse(String),
    #[error("Workflow backend is not configured: {0}")]
    NotConfigured(String),
}

impl WorkflowError {
    /// Classify a non-2xx status with the message recovered from its body.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            403 => WorkflowError::AccessDenied(message),
            404 => WorkflowError::EndpointNotFound(message),
            500 => WorkflowError::BackendInternalError(message),
            _ => WorkflowError::ProtocolError { status, message },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkflowError::Unreachable(_) => ErrorKind::Unreachable,
            WorkflowError::EndpointNotFound(_) => ErrorKind::EndpointNotFound,
            WorkflowError::AccessDenied(_) => ErrorKind::AccessDenied,
            WorkflowError::BackendInternalError(_) => ErrorKind::BackendInternalError,
            WorkflowError::ProtocolError { status, .. } => ErrorKind::ProtocolError(*status),
            WorkflowError::EmptyResponse => ErrorKind::EmptyResponse,
            WorkflowError::MalformedResponse(_) => ErrorKind::MalformedResponse,
            WorkflowError::NotConfigured(_) => ErrorKind::NotConfigured,
        }
    }

    /// HTTP status that produced this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            WorkflowError::AccessDenied(_) => Some(403),
            WorkflowError::EndpointNotFound(_) => Some(404),
            WorkflowError::BackendInternalError(_) => Some(500),
            WorkflowError::ProtocolError { status, .. } => Some(*status),
            _ => None,
        }
    }
}
