//! Generative-model backend seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ChatError;

/// Name of the email function the model may call.
pub const SEND_EMAIL_FUNCTION: &str = "send_email";

/// Whether the model may answer with a function call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolChoice {
    /// Plain text only.
    Disabled,
    /// The `send_email` function is declared.
    SendEmail,
}

/// What the model produced for a prompt.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AiReply {
    /// Plain text; may be empty.
    Text { text: String },
    /// A request to run a named action with JSON arguments.
    Action { name: String, args: Value },
}

impl AiReply {
    pub fn text(text: impl Into<String>) -> Self {
        AiReply::Text { text: text.into() }
    }

    pub fn action(name: impl Into<String>, args: Value) -> Self {
        AiReply::Action {
            name: name.into(),
            args,
        }
    }
}

/// A generative model that can optionally emit function calls.
#[async_trait]
pub trait AiBackend: Send + Sync {
    async fn generate(&self, prompt: &str, tools: ToolChoice) -> Result<AiReply, ChatError>;
}
