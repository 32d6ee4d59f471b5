use serde::{Deserialize, Serialize};

/// Whether the workflow reported success.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure,
}

/// Email metadata echoed back by the workflow.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMeta {
    pub recipient: String,
    /// Empty when the payload carried no subject.
    pub subject: String,
    /// Free-form status string; `"unknown"` when absent.
    pub delivery_status: String,
}

/// Canonical result of one workflow call, whatever shape the backend used.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub outcome: Outcome,
    /// Never empty.
    pub display_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<EmailMeta>,
}

impl WorkflowResult {
    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }
}
