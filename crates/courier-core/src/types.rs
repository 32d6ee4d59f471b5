use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};

// =============================================================================
// Enums
// =============================================================================

/// Author of a conversation message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Text typed (or dictated) by the user.
    User,
    /// Reply produced by a backend.
    Model,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Model => write!(f, "model"),
        }
    }
}

/// Routing policy for a conversation.
///
/// Set by the host before a call; the router never changes it mid-flight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiMode {
    /// Generative model only, function calling disabled.
    Gemini,
    /// Workflow webhook only, no fallback.
    Workflow,
    /// Email-like messages go to the workflow, everything else to the model.
    #[default]
    Hybrid,
}

impl fmt::Display for AiMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AiMode::Gemini => write!(f, "gemini"),
            AiMode::Workflow => write!(f, "workflow"),
            AiMode::Hybrid => write!(f, "hybrid"),
        }
    }
}

impl std::str::FromStr for AiMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(AiMode::Gemini),
            "workflow" => Ok(AiMode::Workflow),
            "hybrid" => Ok(AiMode::Hybrid),
            _ => Err(format!("Unknown AI mode: {}", s)),
        }
    }
}

// =============================================================================
// Message
// =============================================================================

/// A single conversation entry. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique, ordered within a conversation.
    pub id: String,
    pub role: Role,
    /// Display text; may contain fenced code blocks (markdown).
    pub text: String,
    /// Creation time, milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl Message {
    /// Build a message stamped with the next id from `ids`.
    pub fn new(ids: &MessageIdGenerator, role: Role, text: impl Into<String>) -> Self {
        let (id, timestamp) = ids.next();
        Self {
            id,
            role,
            text: text.into(),
            timestamp,
        }
    }
}

/// Produces strictly increasing millisecond-based ids.
///
/// Two messages created in the same millisecond get consecutive values, so
/// ids never collide and sort in creation order.
#[derive(Debug, Default)]
pub struct MessageIdGenerator {
    last: AtomicI64,
}

impl MessageIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `(id, timestamp_ms)` for a new message.
    pub fn next(&self) -> (String, i64) {
        let now = Utc::now().timestamp_millis();
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = if now > prev { now } else { prev + 1 };
            match self
                .last
                .compare_exchange(prev, candidate, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return (candidate.to_string(), now),
                Err(actual) => prev = actual,
            }
        }
    }
}
