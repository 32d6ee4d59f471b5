//! HTTP client for the workflow webhook.
//!
//! One attempt per call: no retries, no polling. The caller decides whether
//! to fall back to another backend.

use std::time::Duration;

use async_trait::async_trait;
use courier_core::config::WorkflowConfig;
use courier_core::SessionId;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde_json::Value;

use crate::adapter::{adapter_for, RequestAdapter};
use crate::error::WorkflowError;
use crate::normalizer::{first_text, normalize, ERROR_BODY_FIELDS};
use crate::types::WorkflowResult;

/// Anything that can deliver a message to the workflow backend.
#[async_trait]
pub trait WorkflowService: Send + Sync {
    /// Send `message` on behalf of `session` and normalize the reply.
    async fn send(&self, message: &str, session: &SessionId)
        -> Result<WorkflowResult, WorkflowError>;
}

/// reqwest-backed [`WorkflowService`].
pub struct WorkflowClient {
    client: Client,
    endpoint: String,
    adapter: Box<dyn RequestAdapter>,
}

impl WorkflowClient {
    /// Create a client for `endpoint`; each request is bounded by `timeout`.
    pub fn new(
        endpoint: impl Into<String>,
        adapter: Box<dyn RequestAdapter>,
        timeout: Duration,
    ) -> Result<Self, WorkflowError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WorkflowError::NotConfigured(format!("HTTP client setup failed: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            adapter,
        })
    }

    pub fn from_config(config: &WorkflowConfig) -> Result<Self, WorkflowError> {
        Self::new(
            config.endpoint.clone(),
            adapter_for(config),
            Duration::from_secs(config.timeout_secs.max(1)),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn is_configured(&self) -> bool {
        !self.endpoint.trim().is_empty() && self.adapter.ensure_configured().is_ok()
    }
}

#[async_trait]
impl WorkflowService for WorkflowClient {
    async fn send(
        &self,
        message: &str,
        session: &SessionId,
    ) -> Result<WorkflowResult, WorkflowError> {
        if self.endpoint.trim().is_empty() {
            return Err(WorkflowError::NotConfigured(
                "no workflow endpoint URL set".to_string(),
            ));
        }
        self.adapter.ensure_configured()?;

        let body = self.adapter.body(message, session);
        tracing::debug!(
            endpoint = %self.endpoint,
            variant = %self.adapter.variant(),
            body = %body,
            "Sending workflow request"
        );

        let mut request = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .json(&body);
        if let Some(token) = self.adapter.bearer_token() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(endpoint = %self.endpoint, error = %e, "Workflow endpoint unreachable");
            WorkflowError::Unreachable(describe_transport_error(&e))
        })?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), "Workflow response received");

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = error_message_from_body(&text)
                .unwrap_or_else(|| format!("HTTP error! Status: {}", status.as_u16()));
            return Err(WorkflowError::from_status(status.as_u16(), message));
        }

        let text = response
            .text()
            .await
            .map_err(|e| WorkflowError::Unreachable(describe_transport_error(&e)))?;
        if text.trim().is_empty() {
            return Err(WorkflowError::EmptyResponse);
        }

        let raw: Value = serde_json::from_str(&text)
            .map_err(|e| WorkflowError::MalformedResponse(e.to_string()))?;

        Ok(normalize(&raw))
    }
}

/// Human-readable message from a non-2xx body, if it carries one.
fn error_message_from_body(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    first_text(value.as_object()?, ERROR_BODY_FIELDS)
}

fn describe_transport_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "the request timed out".to_string()
    } else if err.is_connect() {
        format!("connection failed ({err})")
    } else {
        err.to_string()
    }
}
