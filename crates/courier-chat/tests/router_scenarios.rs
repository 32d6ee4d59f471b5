//! Routing behaviour across modes, with scripted backends that count calls.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::routing::post;
use serde_json::json;

use courier_chat::{
    AiBackend, AiReply, ChatError, Conversation, RoutePath, Router, ToolChoice, APOLOGY_TEXT,
    DEFAULT_AI_TEXT,
};
use courier_core::{AiMode, ErrorKind, SessionId};
use courier_workflow::{
    N8nAdapter, Outcome, WorkflowClient, WorkflowError, WorkflowResult, WorkflowService,
};

// =============================================================================
// Scripted backends
// =============================================================================

#[derive(Default)]
struct ScriptedAi {
    replies: Mutex<VecDeque<Result<AiReply, ChatError>>>,
    calls: Mutex<Vec<(String, ToolChoice)>>,
}

impl ScriptedAi {
    fn with(replies: Vec<Result<AiReply, ChatError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<(String, ToolChoice)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AiBackend for ScriptedAi {
    async fn generate(&self, prompt: &str, tools: ToolChoice) -> Result<AiReply, ChatError> {
        self.calls.lock().unwrap().push((prompt.to_string(), tools));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ChatError::AiBackend("no scripted reply".into())))
    }
}

#[derive(Default)]
struct ScriptedWorkflow {
    replies: Mutex<VecDeque<Result<WorkflowResult, WorkflowError>>>,
    messages: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedWorkflow {
    fn with(replies: Vec<Result<WorkflowResult, WorkflowError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            ..Self::default()
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorkflowService for ScriptedWorkflow {
    async fn send(
        &self,
        message: &str,
        _session: &SessionId,
    ) -> Result<WorkflowResult, WorkflowError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.messages.lock().unwrap().push(message.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(WorkflowError::Unreachable("no scripted reply".into())))
    }
}

fn ok_result(text: &str) -> WorkflowResult {
    WorkflowResult {
        outcome: Outcome::Success,
        display_text: text.to_string(),
        email: None,
    }
}

fn session() -> SessionId {
    SessionId::parse("s1").unwrap()
}

// =============================================================================
// Gemini mode
// =============================================================================

#[tokio::test]
async fn test_gemini_mode_disables_tools_and_never_calls_workflow() {
    let ai = ScriptedAi::with(vec![Ok(AiReply::text("Use flexbox."))]);
    let workflow = ScriptedWorkflow::with(vec![]);
    let router = Router::new(ai.clone(), workflow.clone());

    let reply = router
        .dispatch("send email to a@b.com", AiMode::Gemini, &session())
        .await;
    assert_eq!(reply.text, "Use flexbox.");
    assert_eq!(reply.path, RoutePath::Ai);
    assert_eq!(ai.calls()[0].1, ToolChoice::Disabled);
    assert_eq!(workflow.calls(), 0);
}

#[tokio::test]
async fn test_gemini_mode_empty_text_uses_default() {
    let ai = ScriptedAi::with(vec![Ok(AiReply::text(""))]);
    let router = Router::new(ai, ScriptedWorkflow::with(vec![]));
    let text = router.route("hi", AiMode::Gemini, &session()).await;
    assert_eq!(text, DEFAULT_AI_TEXT);
}

#[tokio::test]
async fn test_gemini_mode_backend_error_is_apology() {
    let ai = ScriptedAi::with(vec![Err(ChatError::AiBackend("quota".into()))]);
    let router = Router::new(ai, ScriptedWorkflow::with(vec![]));
    let reply = router.dispatch("hi", AiMode::Gemini, &session()).await;
    assert_eq!(reply.text, APOLOGY_TEXT);
    assert_eq!(reply.error, Some(ErrorKind::AiBackendError));
}

// =============================================================================
// Workflow mode
// =============================================================================

#[tokio::test]
async fn test_workflow_mode_error_text_is_shown_without_fallback() {
    let ai = ScriptedAi::with(vec![Ok(AiReply::text("should not appear"))]);
    let workflow = ScriptedWorkflow::with(vec![Err(WorkflowError::from_status(
        500,
        "Gmail node crashed".into(),
    ))]);
    let router = Router::new(ai.clone(), workflow.clone());

    let reply = router.dispatch("hello", AiMode::Workflow, &session()).await;
    assert!(reply.text.contains("Gmail node crashed"));
    assert!(reply.text.starts_with("⚠️"));
    assert_eq!(reply.error, Some(ErrorKind::BackendInternalError));
    assert!(ai.calls().is_empty());
    assert_eq!(workflow.calls(), 1);
}

#[tokio::test]
async fn test_workflow_mode_sends_plain_chat_too() {
    let workflow = ScriptedWorkflow::with(vec![Ok(ok_result("Hi there"))]);
    let router = Router::new(ScriptedAi::with(vec![]), workflow.clone());
    let text = router.route("how are you", AiMode::Workflow, &session()).await;
    assert_eq!(text, "Hi there");
    assert_eq!(workflow.messages.lock().unwrap()[0], "how are you");
}

// =============================================================================
// Hybrid mode
// =============================================================================

#[tokio::test]
async fn test_hybrid_email_intent_goes_to_workflow() {
    let ai = ScriptedAi::with(vec![]);
    let workflow = ScriptedWorkflow::with(vec![Ok(ok_result("Queued"))]);
    let router = Router::new(ai.clone(), workflow.clone());

    let reply = router
        .dispatch("notify the team about the release", AiMode::Hybrid, &session())
        .await;
    assert_eq!(reply.text, "Queued");
    assert_eq!(reply.path, RoutePath::Workflow);
    assert!(ai.calls().is_empty());
}

#[tokio::test]
async fn test_hybrid_workflow_failure_falls_back_exactly_once() {
    let ai = ScriptedAi::with(vec![Ok(AiReply::text(
        "I can't reach the email service right now.",
    ))]);
    let workflow = ScriptedWorkflow::with(vec![Err(WorkflowError::Unreachable(
        "connection refused".into(),
    ))]);
    let router = Router::new(ai.clone(), workflow.clone());

    let reply = router
        .dispatch("send email to a@b.com saying hi", AiMode::Hybrid, &session())
        .await;

    assert_eq!(reply.text, "I can't reach the email service right now.");
    assert!(!reply.text.contains("connection refused"));
    assert_eq!(reply.path, RoutePath::Fallback);
    assert_eq!(reply.error, Some(ErrorKind::Unreachable));
    assert_eq!(workflow.calls(), 1, "workflow must not be retried");
    let calls = ai.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "send email to a@b.com saying hi");
    assert_eq!(calls[0].1, ToolChoice::SendEmail);
}

#[tokio::test]
async fn test_hybrid_failed_fallback_reports_ai_error() {
    let ai = ScriptedAi::with(vec![Err(ChatError::AiBackend("quota".into()))]);
    let workflow = ScriptedWorkflow::with(vec![Err(WorkflowError::Unreachable(
        "connection refused".into(),
    ))]);
    let router = Router::new(ai.clone(), workflow.clone());

    let reply = router
        .dispatch("send email to a@b.com saying hi", AiMode::Hybrid, &session())
        .await;
    assert_eq!(reply.text, APOLOGY_TEXT);
    assert_eq!(reply.path, RoutePath::Fallback);
    assert_eq!(reply.error, Some(ErrorKind::AiBackendError));
    assert_eq!(workflow.calls(), 1);
    assert_eq!(ai.calls().len(), 1);
}

#[tokio::test]
async fn test_hybrid_fallback_action_is_not_redispatched() {
    let ai = ScriptedAi::with(vec![Ok(AiReply::action(
        "send_email",
        json!({"recipient": "a@b.com", "subject": "Hi", "body": "Hello"}),
    ))]);
    let workflow = ScriptedWorkflow::with(vec![Err(WorkflowError::EmptyResponse)]);
    let router = Router::new(ai, workflow.clone());

    let reply = router
        .dispatch("email to a@b.com: Hi", AiMode::Hybrid, &session())
        .await;
    assert_eq!(workflow.calls(), 1);
    assert!(reply.text.contains("not sent"));
    assert!(reply.text.contains("a@b.com"));
}

#[tokio::test]
async fn test_hybrid_failure_outcome_does_not_fall_back() {
    let ai = ScriptedAi::with(vec![]);
    let workflow = ScriptedWorkflow::with(vec![Ok(WorkflowResult {
        outcome: Outcome::Failure,
        display_text: "invalid recipient".into(),
        email: None,
    })]);
    let router = Router::new(ai.clone(), workflow);

    let text = router
        .route("send mail to nobody", AiMode::Hybrid, &session())
        .await;
    assert_eq!(text, "⚠️ invalid recipient");
    assert!(ai.calls().is_empty());
}

#[tokio::test]
async fn test_hybrid_plain_chat_uses_ai_with_tools() {
    let ai = ScriptedAi::with(vec![Ok(AiReply::text("Here is a hook."))]);
    let workflow = ScriptedWorkflow::with(vec![]);
    let router = Router::new(ai.clone(), workflow.clone());

    let reply = router
        .dispatch("Write a React hook", AiMode::Hybrid, &session())
        .await;
    assert_eq!(reply.text, "Here is a hook.");
    assert_eq!(ai.calls()[0].1, ToolChoice::SendEmail);
    assert_eq!(workflow.calls(), 0);
}

#[tokio::test]
async fn test_hybrid_function_call_goes_through_bridge() {
    let ai = ScriptedAi::with(vec![Ok(AiReply::action(
        "send_email",
        json!({"recipient": "bob@corp.com", "subject": "Lunch", "body": "Noon?"}),
    ))]);
    let workflow = ScriptedWorkflow::with(vec![Ok(ok_result("ok"))]);
    let router = Router::new(ai, workflow.clone());

    let reply = router
        .dispatch("ask Bob about lunch", AiMode::Hybrid, &session())
        .await;
    assert_eq!(reply.path, RoutePath::AiAction);
    assert_eq!(
        reply.text,
        "✅ Email sent to bob@corp.com with subject \"Lunch\"."
    );
    assert_eq!(
        workflow.messages.lock().unwrap()[0],
        "Send email to bob@corp.com with subject \"Lunch\". Noon?"
    );
}

#[tokio::test]
async fn test_hybrid_function_call_with_empty_recipient_makes_no_workflow_call() {
    let ai = ScriptedAi::with(vec![Ok(AiReply::action(
        "send_email",
        json!({"recipient": "", "subject": "x", "body": "y"}),
    ))]);
    let workflow = ScriptedWorkflow::with(vec![]);
    let router = Router::new(ai, workflow.clone());

    let reply = router
        .dispatch("ping someone", AiMode::Hybrid, &session())
        .await;
    assert_eq!(reply.error, Some(ErrorKind::InvalidFunctionArgs));
    assert!(reply.text.contains("recipient"));
    assert_eq!(workflow.calls(), 0);
}

#[tokio::test]
async fn test_hybrid_bridge_workflow_error_is_shown_verbatim() {
    let ai = ScriptedAi::with(vec![Ok(AiReply::action(
        "send_email",
        json!({"recipient": "a@b.com", "subject": "Hi", "body": "Hello"}),
    ))]);
    let err = WorkflowError::from_status(403, "token revoked".into());
    let expected = err.to_string();
    let workflow = ScriptedWorkflow::with(vec![Err(err)]);
    let router = Router::new(ai, workflow);

    let reply = router.dispatch("ping Al", AiMode::Hybrid, &session()).await;
    assert_eq!(reply.text, format!("⚠️ {expected}"));
    assert_eq!(reply.error, Some(ErrorKind::AccessDenied));
}

#[tokio::test]
async fn test_unknown_function_is_reported() {
    let ai = ScriptedAi::with(vec![Ok(AiReply::action("delete_files", json!({})))]);
    let workflow = ScriptedWorkflow::with(vec![]);
    let router = Router::new(ai, workflow.clone());
    let text = router.route("tidy up", AiMode::Hybrid, &session()).await;
    assert!(text.contains("delete_files"));
    assert_eq!(workflow.calls(), 0);
}

// =============================================================================
// Panicking backends
// =============================================================================

struct PanickingAi;

#[async_trait]
impl AiBackend for PanickingAi {
    async fn generate(&self, _prompt: &str, _tools: ToolChoice) -> Result<AiReply, ChatError> {
        panic!("model client bug");
    }
}

struct PanickingWorkflow;

#[async_trait]
impl WorkflowService for PanickingWorkflow {
    async fn send(
        &self,
        _message: &str,
        _session: &SessionId,
    ) -> Result<WorkflowResult, WorkflowError> {
        panic!("webhook client bug");
    }
}

#[tokio::test]
async fn test_backend_panic_becomes_apology() {
    let router = Router::new(Arc::new(PanickingAi), Arc::new(PanickingWorkflow));

    for mode in [AiMode::Gemini, AiMode::Workflow, AiMode::Hybrid] {
        let reply = router.dispatch("hello", mode, &session()).await;
        assert_eq!(reply.text, APOLOGY_TEXT, "mode {mode}");
    }
    let reply = router
        .dispatch("send email to a@b.com", AiMode::Hybrid, &session())
        .await;
    assert_eq!(reply.text, APOLOGY_TEXT);
}

#[tokio::test]
async fn test_conversation_survives_backend_panic() {
    let router = Router::new(
        Arc::new(PanickingAi),
        ScriptedWorkflow::with(vec![Ok(ok_result("ok"))]),
    );
    let convo = Conversation::new(session(), AiMode::Gemini);

    let first = convo.send(&router, "boom").await.unwrap();
    assert_eq!(first.text, APOLOGY_TEXT);
    assert!(!convo.is_busy());

    convo.set_mode(AiMode::Workflow);
    let second = convo.send(&router, "hello").await.unwrap();
    assert_eq!(second.text, "ok");
}

// =============================================================================
// Against a real HTTP endpoint
// =============================================================================

async fn spawn_endpoint(status: StatusCode, body: &'static str) -> String {
    let app = axum::Router::new().route("/webhook", post(move || async move { (status, body) }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/webhook", addr)
}

fn http_router(url: &str, ai: Arc<ScriptedAi>) -> Router {
    let client = WorkflowClient::new(url, Box::new(N8nAdapter), Duration::from_secs(5)).unwrap();
    Router::new(ai, Arc::new(client))
}

#[tokio::test]
async fn test_round_trip_display_contains_recipient_and_subject() {
    let url = spawn_endpoint(
        StatusCode::OK,
        r#"{"output": "Done", "recipient": "a@b.com", "subject": "Hi", "status": "sent"}"#,
    )
    .await;
    let router = http_router(&url, ScriptedAi::with(vec![]));

    let text = router
        .route(
            "Send email to a@b.com with subject Hi and body Hello",
            AiMode::Hybrid,
            &session(),
        )
        .await;
    assert!(text.contains("Done"));
    assert!(text.contains("a@b.com"));
    assert!(text.contains("Hi"));
}

#[tokio::test]
async fn test_404_is_endpoint_not_found_and_session_unchanged() {
    let url = spawn_endpoint(
        StatusCode::NOT_FOUND,
        r#"{"message": "webhook not registered"}"#,
    )
    .await;
    let router = http_router(&url, ScriptedAi::with(vec![]));
    let convo = Conversation::new(session(), AiMode::Workflow);

    let (message, reply) = convo.send_with_reply(&router, "hello").await.unwrap();
    assert_eq!(reply.error, Some(ErrorKind::EndpointNotFound));
    assert!(message.text.contains("webhook not registered"));
    assert_eq!(convo.session(), session());
}

#[tokio::test]
async fn test_next_message_unaffected_by_previous_failure() {
    let ai = ScriptedAi::with(vec![
        Err(ChatError::AiBackend("boom".into())),
        Ok(AiReply::text("fine now")),
    ]);
    let router = Router::new(ai, ScriptedWorkflow::with(vec![]));
    let convo = Conversation::new(session(), AiMode::Gemini);

    let first = convo.send(&router, "one").await.unwrap();
    assert_eq!(first.text, APOLOGY_TEXT);
    let second = convo.send(&router, "two").await.unwrap();
    assert_eq!(second.text, "fine now");
    assert_eq!(convo.messages().len(), 4);
}
