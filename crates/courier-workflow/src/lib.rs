//! Workflow automation backend for courier.
//!
//! Sends a natural-language message plus session id to an external webhook,
//! classifies transport and HTTP failures, and normalizes whatever JSON the
//! webhook returns into a [`WorkflowResult`].

pub mod adapter;
pub mod client;
pub mod error;
pub mod normalizer;
pub mod types;

pub use adapter::{adapter_for, CodeWordsAdapter, N8nAdapter, RequestAdapter};
pub use client::{WorkflowClient, WorkflowService};
pub use error::WorkflowError;
pub use normalizer::{normalize, DEFAULT_DISPLAY_TEXT};
pub use types::{EmailMeta, Outcome, WorkflowResult};
