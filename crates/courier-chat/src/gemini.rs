//! Gemini REST backend.
//!
//! Calls `models/{model}:generateContent` directly and maps the first
//! candidate to an [`AiReply`]: a `functionCall` part wins over text parts.

use std::time::Duration;

use async_trait::async_trait;
use courier_core::config::GeminiConfig;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::ai::{AiBackend, AiReply, ToolChoice, SEND_EMAIL_FUNCTION};
use crate::error::ChatError;

/// [`AiBackend`] talking to the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiBackend {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    system_instruction: Option<String>,
}

impl GeminiBackend {
    pub fn new(config: &GeminiConfig) -> Result<Self, ChatError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| ChatError::AiBackend(format!("HTTP client setup failed: {e}")))?;
        let instruction = config.system_instruction.trim();
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            system_instruction: (!instruction.is_empty()).then(|| instruction.to_string()),
        })
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    fn build_request(&self, prompt: &str, tools: ToolChoice) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![TextPart {
                    text: prompt.to_string(),
                }],
            }],
            system_instruction: self.system_instruction.as_ref().map(|text| Content {
                role: None,
                parts: vec![TextPart { text: text.clone() }],
            }),
            tools: match tools {
                ToolChoice::Disabled => None,
                ToolChoice::SendEmail => Some(vec![Tool {
                    function_declarations: vec![send_email_declaration()],
                }]),
            },
        }
    }
}

#[async_trait]
impl AiBackend for GeminiBackend {
    async fn generate(&self, prompt: &str, tools: ToolChoice) -> Result<AiReply, ChatError> {
        if !self.is_configured() {
            return Err(ChatError::NotConfigured("Gemini API key".to_string()));
        }

        let url = format!("{}/{}:generateContent", self.base_url, self.model);
        let body = self.build_request(prompt, tools);
        tracing::debug!(model = %self.model, tools = ?tools, "Sending Gemini request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatError::AiBackend(format!("Gemini API request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(map_http_error(status, &text));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ChatError::AiBackend(format!("Failed to parse Gemini response: {e}")))?;

        Ok(extract_reply(parsed))
    }
}

/// Declaration of the `send_email` function in Gemini's schema dialect.
fn send_email_declaration() -> Value {
    json!({
        "name": SEND_EMAIL_FUNCTION,
        "description": "Send an email on the user's behalf through the email workflow.",
        "parameters": {
            "type": "OBJECT",
            "properties": {
                "recipient": {
                    "type": "STRING",
                    "description": "Email address of the recipient."
                },
                "subject": {
                    "type": "STRING",
                    "description": "Subject line."
                },
                "body": {
                    "type": "STRING",
                    "description": "Plain-text body of the email."
                }
            },
            "required": ["recipient", "subject", "body"]
        }
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Tool>>,
}

#[derive(Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<TextPart>,
}

#[derive(Serialize)]
struct TextPart {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    function_declarations: Vec<Value>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartResponse {
    text: Option<String>,
    function_call: Option<FunctionCall>,
}

#[derive(Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

/// First function call in the first candidate, else its joined text.
fn extract_reply(response: GenerateContentResponse) -> AiReply {
    let parts = response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts)
        .unwrap_or_default();

    let mut text = String::new();
    for part in parts {
        if let Some(call) = part.function_call {
            return AiReply::action(call.name, call.args);
        }
        if let Some(t) = part.text {
            text.push_str(&t);
        }
    }
    AiReply::text(text)
}

fn map_http_error(status: StatusCode, body: &str) -> ChatError {
    let message = serde_json::from_str::<ErrorWrapper>(body)
        .ok()
        .and_then(|wrapper| {
            let msg = wrapper.error.message?;
            Some(match wrapper.error.status {
                Some(s) if !s.is_empty() => format!("{s}: {msg}"),
                _ => msg,
            })
        })
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
    ChatError::AiBackend(message)
}
