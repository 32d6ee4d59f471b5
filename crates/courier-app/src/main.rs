//! Courier application binary - composition root.
//!
//! 1. Parse CLI flags and load configuration (file, then env overrides)
//! 2. Initialize tracing
//! 3. Load or create the persisted session identifier
//! 4. Build the Gemini backend, the workflow client and the router
//! 5. Answer one `--message` or run the interactive loop

mod cli;
mod repl;

use std::sync::Arc;

use clap::Parser;
use courier_chat::{Conversation, GeminiBackend, Router};
use courier_core::{CourierConfig, SessionStore};
use courier_workflow::WorkflowClient;

use cli::CliArgs;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = CourierConfig::load_or_default(&config_file);
    config.apply_env_overrides();

    // Tracing. RUST_LOG wins over flags and config.
    let level = args.resolve_log_level(config.effective_log_level());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting courier v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    // Session.
    let data_dir = config.resolved_data_dir();
    let store = SessionStore::in_dir(&data_dir);
    let session = if args.reset_session {
        store.reset()?
    } else {
        store.load_or_create()?
    };
    tracing::info!(session = %session, path = %store.path().display(), "Session ready");

    // Backends.
    let gemini = GeminiBackend::new(&config.gemini)?;
    if !gemini.is_configured() {
        tracing::warn!("Gemini API key not set; AI replies will fail until GEMINI_API_KEY is provided");
    }
    let workflow = WorkflowClient::from_config(&config.workflow)?;
    if !workflow.is_configured() {
        tracing::warn!(
            variant = %config.workflow.variant,
            "Workflow backend not configured; set COURIER_WORKFLOW_URL (and COURIER_WORKFLOW_API_KEY for code_words)"
        );
    }

    let mode = args.resolve_mode(config.routing.mode);
    let router = Router::new(Arc::new(gemini), Arc::new(workflow));
    let conversation = Conversation::new(session, mode);
    tracing::info!(mode = %mode, "Router ready");

    if let Some(message) = args.message.as_deref() {
        let reply = conversation.send(&router, message).await?;
        println!("{}", reply.text);
        return Ok(());
    }

    repl::run(&conversation, &router, &store).await
}
