//! Error types for message routing.

use courier_core::ErrorKind;
use courier_workflow::WorkflowError;

/// Errors surfaced to the router by the AI backend, the action bridge and
/// the conversation.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("a message is already being processed")]
    Busy,
    #[error("invalid send_email arguments: {0}")]
    InvalidFunctionArgs(String),
    #[error("AI backend error: {0}")]
    AiBackend(String),
    #[error("{0} is not configured")]
    NotConfigured(String),
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}

impl ChatError {
    /// Failure class for backend errors; `None` for rejected input.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ChatError::EmptyMessage | ChatError::Busy => None,
            ChatError::InvalidFunctionArgs(_) => Some(ErrorKind::InvalidFunctionArgs),
            ChatError::AiBackend(_) => Some(ErrorKind::AiBackendError),
            ChatError::NotConfigured(_) => Some(ErrorKind::NotConfigured),
            ChatError::Workflow(e) => Some(e.kind()),
        }
    }
}
