//! Message routing for courier.
//!
//! Classifies each user message, sends it to the generative model or the
//! workflow webhook according to the active [`AiMode`], bridges model
//! function calls into workflow sends, and always resolves to display text.
//!
//! [`AiMode`]: courier_core::AiMode

pub mod ai;
pub mod bridge;
pub mod classifier;
pub mod conversation;
pub mod error;
pub mod gemini;
pub mod router;

pub use ai::{AiBackend, AiReply, ToolChoice, SEND_EMAIL_FUNCTION};
pub use bridge::{ActionBridge, EmailFunctionCall, WARNING_MARKER};
pub use classifier::{IntentClassifier, IntentSignal};
pub use conversation::Conversation;
pub use error::ChatError;
pub use gemini::GeminiBackend;
pub use router::{render_workflow_result, RoutePath, RouteReply, Router, APOLOGY_TEXT, DEFAULT_AI_TEXT};
