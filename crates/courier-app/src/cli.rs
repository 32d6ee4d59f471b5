//! CLI argument definitions for the courier binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use courier_core::AiMode;
use std::path::PathBuf;

/// Courier: chat with a generative model and send email through a workflow webhook.
#[derive(Parser, Debug)]
#[command(name = "courier", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Routing mode (gemini, workflow, hybrid).
    #[arg(short = 'm', long = "mode")]
    pub mode: Option<AiMode>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Send one message, print the reply and exit.
    #[arg(long = "message")]
    pub message: Option<String>,

    /// Replace the stored session identifier before starting.
    #[arg(long = "reset-session")]
    pub reset_session: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > COURIER_CONFIG env var > ~/.courier/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("COURIER_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the routing mode. `config_mode` already carries COURIER_MODE.
    pub fn resolve_mode(&self, config_mode: AiMode) -> AiMode {
        self.mode.unwrap_or(config_mode)
    }

    /// Resolve the log filter.
    ///
    /// Priority: --log-level flag > config (debug toggle, then log_level).
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".courier").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".courier").join("config.toml");
    }
    PathBuf::from("config.toml")
}
