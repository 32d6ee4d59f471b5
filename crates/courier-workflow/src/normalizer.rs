//! Response normalization.
//!
//! Webhook payloads have drifted through several incompatible shapes. Rather
//! than versioned parsers, every field is looked up through a priority list
//! of known names; anything missing falls back to a default.

use serde_json::{Map, Value};

use crate::types::{EmailMeta, Outcome, WorkflowResult};

/// Display text used when the payload carries no usable text.
pub const DEFAULT_DISPLAY_TEXT: &str = "Workflow completed successfully";

/// Display text for a failure payload without any message.
const DEFAULT_FAILURE_TEXT: &str = "The workflow reported a failure";

const UNKNOWN_STATUS: &str = "unknown";

/// Text-bearing fields, highest priority first.
const TEXT_FIELDS: &[&str] = &["output", "message", "response", "aiResponse"];

const RECIPIENT_FIELDS: &[&str] = &["recipient", "recipient_email"];

/// Recipient fields inside the nested `emailDetails` object.
const DETAIL_RECIPIENT_FIELDS: &[&str] = &["recipient", "recipient_email", "to"];

const SUBJECT_FIELDS: &[&str] = &["subject"];

/// Fields whose presence marks the payload as a failure.
const ERROR_FIELDS: &[&str] = &["error", "errorMessage"];

/// Fields a non-2xx error body may carry a human-readable message in.
pub(crate) const ERROR_BODY_FIELDS: &[&str] = &["error", "errorMessage", "message", "detail"];

/// Map any JSON value to a [`WorkflowResult`]. Never fails.
pub fn normalize(raw: &Value) -> WorkflowResult {
    let Some(obj) = payload_object(raw) else {
        let display_text = bare_text(raw).unwrap_or(DEFAULT_DISPLAY_TEXT).to_string();
        return WorkflowResult {
            outcome: Outcome::Success,
            display_text,
            email: None,
        };
    };

    let text = first_text(obj, TEXT_FIELDS);
    let email = email_meta(obj);

    if let Some(reason) = failure_reason(obj) {
        let display_text = reason
            .or(text)
            .unwrap_or_else(|| DEFAULT_FAILURE_TEXT.to_string());
        return WorkflowResult {
            outcome: Outcome::Failure,
            display_text,
            email,
        };
    }

    WorkflowResult {
        outcome: Outcome::Success,
        display_text: text.unwrap_or_else(|| DEFAULT_DISPLAY_TEXT.to_string()),
        email,
    }
}

/// First non-empty string among `fields`, in priority order.
///
/// A field holding an object with a `message` string (e.g. `{"error":
/// {"message": "..."}}`) also counts.
pub(crate) fn first_text(obj: &Map<String, Value>, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|field| match obj.get(*field)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Object(inner) => inner
            .get("message")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        _ => None,
    })
}

/// Unwrap the payload to the object that carries the fields.
///
/// Webhook engines often reply with a single-element list.
fn payload_object(raw: &Value) -> Option<&Map<String, Value>> {
    match raw {
        Value::Object(obj) => Some(obj),
        Value::Array(items) => items.iter().find_map(Value::as_object),
        _ => None,
    }
}

/// Text of a bare string payload, or of the first non-empty string in a
/// list that carries no object.
fn bare_text(raw: &Value) -> Option<&str> {
    match raw {
        Value::String(s) => Some(s.trim()).filter(|s| !s.is_empty()),
        Value::Array(items) => items
            .iter()
            .filter(|item| item.is_string())
            .find_map(bare_text),
        _ => None,
    }
}

/// `Some(message)` if the payload signals failure; the inner option holds
/// the explicit error text when there is one.
fn failure_reason(obj: &Map<String, Value>) -> Option<Option<String>> {
    let error_present = ERROR_FIELDS
        .iter()
        .any(|f| matches!(obj.get(*f), Some(v) if !v.is_null() && v != &Value::Bool(false)));
    let explicit_false = obj.get("success") == Some(&Value::Bool(false));

    if error_present || explicit_false {
        Some(first_text(obj, ERROR_FIELDS))
    } else {
        None
    }
}

fn email_meta(obj: &Map<String, Value>) -> Option<EmailMeta> {
    let details = obj.get("emailDetails").and_then(Value::as_object);

    let recipient = first_text(obj, RECIPIENT_FIELDS)
        .or_else(|| details.and_then(|d| first_text(d, DETAIL_RECIPIENT_FIELDS)))?;

    let subject = first_text(obj, SUBJECT_FIELDS)
        .or_else(|| details.and_then(|d| first_text(d, SUBJECT_FIELDS)))
        .unwrap_or_default();

    Some(EmailMeta {
        recipient,
        subject,
        delivery_status: delivery_status(obj),
    })
}

fn delivery_status(obj: &Map<String, Value>) -> String {
    if let Some(status) = obj.get("status") {
        match status {
            Value::String(s) if !s.trim().is_empty() => return s.trim().to_string(),
            Value::Bool(true) => return "sent".to_string(),
            Value::Bool(false) => return "failed".to_string(),
            Value::Number(n) => return n.to_string(),
            _ => {}
        }
    }
    if let Some(sent) = obj.get("emailSent").and_then(Value::as_bool) {
        return if sent { "sent" } else { "not_sent" }.to_string();
    }
    if let Some(success) = obj.get("success").and_then(Value::as_bool) {
        return if success { "sent" } else { "failed" }.to_string();
    }
    UNKNOWN_STATUS.to_string()
}
