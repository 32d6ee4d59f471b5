//! Per-message routing between the AI backend and the workflow.
//!
//! Every path ends in display text. Errors are logged here and turned into
//! a string; nothing propagates past [`Router::dispatch`], including a panic
//! inside a backend.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;

use courier_core::{AiMode, ErrorKind, SessionId};
use courier_workflow::{Outcome, WorkflowResult, WorkflowService};

use crate::ai::{AiBackend, AiReply, ToolChoice, SEND_EMAIL_FUNCTION};
use crate::bridge::{warning, ActionBridge, EmailFunctionCall, WARNING_MARKER};
use crate::classifier::IntentClassifier;
use crate::error::ChatError;

/// Shown when the model returns no usable text.
pub const DEFAULT_AI_TEXT: &str = "I couldn't generate a response.";

/// Shown when the AI backend fails outright.
pub const APOLOGY_TEXT: &str = "Sorry, I encountered an error while processing your request.";

/// Which backends produced a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutePath {
    /// Workflow called directly with the user's text.
    Workflow,
    /// AI backend answered in plain text.
    Ai,
    /// AI backend requested `send_email`; the bridge ran it.
    AiAction,
    /// Direct workflow call failed; the AI backend answered instead.
    Fallback,
}

/// Display text plus how it was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteReply {
    pub text: String,
    pub path: RoutePath,
    /// Classification of the error that shaped this reply, if any.
    pub error: Option<ErrorKind>,
}

impl RouteReply {
    fn ok(text: impl Into<String>, path: RoutePath) -> Self {
        Self {
            text: text.into(),
            path,
            error: None,
        }
    }

    fn failed(text: impl Into<String>, path: RoutePath, error: Option<ErrorKind>) -> Self {
        Self {
            text: text.into(),
            path,
            error,
        }
    }
}

pub struct Router {
    ai: Arc<dyn AiBackend>,
    workflow: Arc<dyn WorkflowService>,
    classifier: IntentClassifier,
    bridge: ActionBridge,
}

impl Router {
    pub fn new(ai: Arc<dyn AiBackend>, workflow: Arc<dyn WorkflowService>) -> Self {
        Self::with_classifier(ai, workflow, IntentClassifier::new())
    }

    pub fn with_classifier(
        ai: Arc<dyn AiBackend>,
        workflow: Arc<dyn WorkflowService>,
        classifier: IntentClassifier,
    ) -> Self {
        let bridge = ActionBridge::new(Arc::clone(&workflow));
        Self {
            ai,
            workflow,
            classifier,
            bridge,
        }
    }

    pub fn classifier(&self) -> &IntentClassifier {
        &self.classifier
    }

    /// Display text for `text` under `mode`.
    pub async fn route(&self, text: &str, mode: AiMode, session: &SessionId) -> String {
        self.dispatch(text, mode, session).await.text
    }

    /// Route one message and report the path taken.
    pub async fn dispatch(&self, text: &str, mode: AiMode, session: &SessionId) -> RouteReply {
        tracing::debug!(mode = %mode, session = %session, "Routing message");
        let routed = AssertUnwindSafe(async {
            match mode {
                AiMode::Workflow => self.workflow_only(text, session).await,
                AiMode::Gemini => self.ai_only(text).await,
                AiMode::Hybrid => self.hybrid(text, session).await,
            }
        })
        .catch_unwind()
        .await;

        routed.unwrap_or_else(|panic| {
            tracing::error!(
                mode = %mode,
                panic = %panic_message(&*panic),
                "Backend panicked while routing"
            );
            let path = match mode {
                AiMode::Workflow => RoutePath::Workflow,
                AiMode::Gemini | AiMode::Hybrid => RoutePath::Ai,
            };
            RouteReply::failed(APOLOGY_TEXT, path, None)
        })
    }

    async fn workflow_only(&self, text: &str, session: &SessionId) -> RouteReply {
        match self.workflow.send(text, session).await {
            Ok(result) => RouteReply::ok(render_workflow_result(&result), RoutePath::Workflow),
            Err(e) => {
                tracing::error!(error = %e, kind = %e.kind(), "Workflow call failed");
                RouteReply::failed(warning(&e), RoutePath::Workflow, Some(e.kind()))
            }
        }
    }

    async fn ai_only(&self, text: &str) -> RouteReply {
        match self.ai.generate(text, ToolChoice::Disabled).await {
            Ok(AiReply::Text { text }) => RouteReply::ok(or_default(text), RoutePath::Ai),
            Ok(AiReply::Action { name, .. }) => {
                tracing::warn!(function = %name, "Function call received with tools disabled");
                RouteReply::ok(DEFAULT_AI_TEXT, RoutePath::Ai)
            }
            Err(e) => {
                tracing::error!(error = %e, "AI backend call failed");
                RouteReply::failed(APOLOGY_TEXT, RoutePath::Ai, e.kind())
            }
        }
    }

    async fn hybrid(&self, text: &str, session: &SessionId) -> RouteReply {
        if let Some(signal) = self.classifier.signal(text) {
            tracing::info!(signal = ?signal, "Email intent detected, calling workflow");
            match self.workflow.send(text, session).await {
                Ok(result) => {
                    return RouteReply::ok(render_workflow_result(&result), RoutePath::Workflow)
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        kind = %e.kind(),
                        "Workflow call failed, falling back to AI backend"
                    );
                    return self.fallback(text, e.kind()).await;
                }
            }
        }

        match self.ai.generate(text, ToolChoice::SendEmail).await {
            Ok(AiReply::Text { text }) => RouteReply::ok(or_default(text), RoutePath::Ai),
            Ok(AiReply::Action { name, args }) => self.run_action(&name, &args, session).await,
            Err(e) => {
                tracing::error!(error = %e, "AI backend call failed");
                RouteReply::failed(APOLOGY_TEXT, RoutePath::Ai, e.kind())
            }
        }
    }

    /// One AI call after a failed direct workflow send. An action reply is
    /// not dispatched: the workflow already failed for this message.
    async fn fallback(&self, text: &str, cause: ErrorKind) -> RouteReply {
        match self.ai.generate(text, ToolChoice::SendEmail).await {
            Ok(AiReply::Text { text }) => {
                RouteReply::failed(or_default(text), RoutePath::Fallback, Some(cause))
            }
            Ok(AiReply::Action { args, .. }) => {
                let draft = EmailFunctionCall::from_args(&args).unwrap_or_default();
                RouteReply::failed(render_draft(&draft), RoutePath::Fallback, Some(cause))
            }
            Err(e) => {
                tracing::error!(error = %e, workflow_error = %cause, "Fallback AI call failed");
                let kind = e.kind().or(Some(cause));
                RouteReply::failed(APOLOGY_TEXT, RoutePath::Fallback, kind)
            }
        }
    }

    async fn run_action(
        &self,
        name: &str,
        args: &serde_json::Value,
        session: &SessionId,
    ) -> RouteReply {
        if name != SEND_EMAIL_FUNCTION {
            tracing::warn!(function = %name, "Unknown function call from AI backend");
            return RouteReply::failed(
                warning(format!("Unsupported action: {name}")),
                RoutePath::AiAction,
                Some(ErrorKind::InvalidFunctionArgs),
            );
        }

        let outcome = match EmailFunctionCall::from_args(args) {
            Ok(call) => self.bridge.handle_function_call(&call, session).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(result) => RouteReply::ok(result.display_text, RoutePath::AiAction),
            Err(e) => {
                tracing::error!(error = %e, "send_email action failed");
                let kind = e.kind();
                RouteReply::failed(display_chat_error(&e), RoutePath::AiAction, kind)
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

fn or_default(text: String) -> String {
    if text.trim().is_empty() {
        DEFAULT_AI_TEXT.to_string()
    } else {
        text
    }
}

fn display_chat_error(e: &ChatError) -> String {
    match e {
        ChatError::AiBackend(_) => APOLOGY_TEXT.to_string(),
        other => warning(other),
    }
}

/// Display text for a normalized workflow result, with email details
/// appended when the workflow echoed them.
pub fn render_workflow_result(result: &WorkflowResult) -> String {
    if result.outcome == Outcome::Failure {
        return warning(&result.display_text);
    }
    let mut text = result.display_text.clone();
    if let Some(meta) = &result.email {
        text.push_str(&format!("\n\nTo: {}", meta.recipient));
        if !meta.subject.is_empty() {
            text.push_str(&format!("\nSubject: {}", meta.subject));
        }
        text.push_str(&format!("\nStatus: {}", meta.delivery_status));
    }
    text
}

fn render_draft(call: &EmailFunctionCall) -> String {
    let field = |value: &str| {
        if value.trim().is_empty() {
            "(missing)".to_string()
        } else {
            value.trim().to_string()
        }
    };
    format!(
        "{} The email workflow is unavailable, so this draft was not sent.\n\nTo: {}\nSubject: {}\n\n{}",
        WARNING_MARKER,
        field(&call.recipient),
        field(&call.subject),
        field(&call.body)
    )
}
