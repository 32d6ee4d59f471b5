//! Request-shape adapters, keyed by workflow backend type.

use courier_core::config::{WorkflowConfig, WorkflowVariant};
use courier_core::SessionId;
use serde_json::{json, Value};

use crate::error::WorkflowError;

/// Builds the request body and credentials for one backend type.
pub trait RequestAdapter: Send + Sync {
    /// Backend type this adapter speaks to.
    fn variant(&self) -> WorkflowVariant;

    /// JSON body for a single message.
    fn body(&self, message: &str, session: &SessionId) -> Value;

    /// Bearer token to attach, if the backend requires one.
    fn bearer_token(&self) -> Option<&str> {
        None
    }

    /// Fail early when a required credential is missing.
    fn ensure_configured(&self) -> Result<(), WorkflowError> {
        Ok(())
    }
}

/// Webhook that tracks conversations by session id.
pub struct N8nAdapter;

impl RequestAdapter for N8nAdapter {
    fn variant(&self) -> WorkflowVariant {
        WorkflowVariant::N8n
    }

    fn body(&self, message: &str, session: &SessionId) -> Value {
        json!({
            "chatInput": message,
            "sessionId": session.as_str(),
            "action": "sendMessage",
        })
    }
}

/// Hosted email runner with bearer authentication and no session tracking.
pub struct CodeWordsAdapter {
    api_key: String,
}

impl CodeWordsAdapter {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }
}

impl RequestAdapter for CodeWordsAdapter {
    fn variant(&self) -> WorkflowVariant {
        WorkflowVariant::CodeWords
    }

    fn body(&self, message: &str, _session: &SessionId) -> Value {
        json!({ "text_message": message })
    }

    fn bearer_token(&self) -> Option<&str> {
        Some(&self.api_key)
    }

    fn ensure_configured(&self) -> Result<(), WorkflowError> {
        if self.api_key.trim().is_empty() {
            return Err(WorkflowError::NotConfigured(
                "an API key is required for the code_words backend".to_string(),
            ));
        }
        Ok(())
    }
}

/// Adapter for the configured backend type.
pub fn adapter_for(config: &WorkflowConfig) -> Box<dyn RequestAdapter> {
    match config.variant {
        WorkflowVariant::N8n => Box::new(N8nAdapter),
        WorkflowVariant::CodeWords => Box::new(CodeWordsAdapter::new(config.api_key.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> SessionId {
        SessionId::parse("s1").unwrap()
    }

    #[test]
    fn test_n8n_body_shape() {
        let body = N8nAdapter.body("Send email to a@b.com", &session());
        assert_eq!(
            body,
            json!({
                "chatInput": "Send email to a@b.com",
                "sessionId": "s1",
                "action": "sendMessage"
            })
        );
        assert!(N8nAdapter.bearer_token().is_none());
        assert!(N8nAdapter.ensure_configured().is_ok());
    }

    #[test]
    fn test_code_words_body_shape() {
        let adapter = CodeWordsAdapter::new("key-123");
        let body = adapter.body("hello", &session());
        assert_eq!(body, json!({"text_message": "hello"}));
        assert_eq!(adapter.bearer_token(), Some("key-123"));
        assert!(adapter.ensure_configured().is_ok());
    }

    #[test]
    fn test_code_words_without_key_is_not_configured() {
        let adapter = CodeWordsAdapter::new("  ");
        let err = adapter.ensure_configured().unwrap_err();
        assert!(matches!(err, WorkflowError::NotConfigured(_)));
    }

    #[test]
    fn test_adapter_for_variant() {
        let mut config = WorkflowConfig::default();
        assert_eq!(adapter_for(&config).variant(), WorkflowVariant::N8n);

        config.variant = WorkflowVariant::CodeWords;
        config.api_key = "k".to_string();
        let adapter = adapter_for(&config);
        assert_eq!(adapter.variant(), WorkflowVariant::CodeWords);
        assert_eq!(adapter.bearer_token(), Some("k"));
    }
}
