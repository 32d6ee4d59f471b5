//! Turns a model's `send_email` function call into a workflow send.

use std::sync::Arc;

use courier_core::SessionId;
use courier_workflow::{Outcome, WorkflowResult, WorkflowService};
use serde::Deserialize;
use serde_json::Value;

use crate::error::ChatError;

/// Prefix for any failure shown to the user.
pub const WARNING_MARKER: &str = "⚠️";

/// Arguments of a `send_email` call. Missing fields deserialize as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EmailFunctionCall {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

impl EmailFunctionCall {
    pub fn new(
        recipient: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            recipient: recipient.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// Parse model-supplied arguments. Wrong types are rejected, absent
    /// fields become empty and are caught by [`validate`](Self::validate).
    pub fn from_args(args: &Value) -> Result<Self, ChatError> {
        if args.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(args.clone())
            .map_err(|e| ChatError::InvalidFunctionArgs(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ChatError> {
        let missing: Vec<&str> = [
            ("recipient", &self.recipient),
            ("subject", &self.subject),
            ("body", &self.body),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ChatError::InvalidFunctionArgs(format!(
                "missing {}",
                missing.join(", ")
            )))
        }
    }

    /// The natural-language instruction handed to the workflow.
    pub fn instruction(&self) -> String {
        format!(
            "Send email to {} with subject \"{}\". {}",
            self.recipient.trim(),
            self.subject.trim(),
            self.body.trim()
        )
    }
}

/// Prefix `text` with [`WARNING_MARKER`].
pub fn warning(text: impl std::fmt::Display) -> String {
    format!("{WARNING_MARKER} {text}")
}

pub struct ActionBridge {
    workflow: Arc<dyn WorkflowService>,
}

impl ActionBridge {
    pub fn new(workflow: Arc<dyn WorkflowService>) -> Self {
        Self { workflow }
    }

    /// Validate, send through the workflow, and rewrite the display text
    /// into a confirmation (or a marked failure).
    ///
    /// Invalid arguments fail before any network call. Workflow errors are
    /// returned unchanged so the caller can show them verbatim.
    pub async fn handle_function_call(
        &self,
        call: &EmailFunctionCall,
        session: &SessionId,
    ) -> Result<WorkflowResult, ChatError> {
        call.validate()?;

        let instruction = call.instruction();
        tracing::info!(
            recipient = %call.recipient.trim(),
            session = %session,
            "Dispatching send_email through workflow"
        );

        let mut result = self.workflow.send(&instruction, session).await?;

        let (recipient, subject) = match &result.email {
            Some(meta) => (
                non_empty_or(&meta.recipient, call.recipient.trim()).to_string(),
                non_empty_or(&meta.subject, call.subject.trim()).to_string(),
            ),
            None => (
                call.recipient.trim().to_string(),
                call.subject.trim().to_string(),
            ),
        };
        let status = result.email.as_ref().map(|meta| meta.delivery_status.clone());

        match result.outcome {
            Outcome::Success if status.as_deref().map_or(true, is_delivered) => {
                result.display_text =
                    format!("✅ Email sent to {recipient} with subject \"{subject}\".");
            }
            Outcome::Success => {
                let status = status.unwrap_or_default();
                tracing::warn!(
                    recipient = %recipient,
                    status = %status,
                    detail = %result.display_text,
                    "Workflow accepted the request but did not deliver the email"
                );
                result.outcome = Outcome::Failure;
                result.display_text = warning(format!(
                    "{}\n\nTo: {recipient}\nSubject: {subject}\nStatus: {status}",
                    result.display_text
                ));
            }
            Outcome::Failure => {
                tracing::warn!(detail = %result.display_text, "Workflow reported email failure");
                result.display_text = warning(&result.display_text);
            }
        }
        Ok(result)
    }
}

/// Delivery statuses that confirm the email went out. `unknown` means the
/// workflow did not say otherwise.
const DELIVERED_STATUSES: &[&str] = &["sent", "delivered", "success", "unknown"];

fn is_delivered(status: &str) -> bool {
    let status = status.trim();
    DELIVERED_STATUSES
        .iter()
        .any(|s| s.eq_ignore_ascii_case(status))
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback
    } else {
        trimmed
    }
}
