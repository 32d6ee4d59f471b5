use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{CourierError, Result};
use crate::types::AiMode;

/// Top-level configuration for courier.
///
/// Loaded from `~/.courier/config.toml` by default, then overlaid with
/// environment variables (see [`CourierConfig::apply_env_overrides`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourierConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub workflow: WorkflowConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
}

impl CourierConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CourierConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| CourierError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Overlay values from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Overlay values from an arbitrary variable lookup.
    ///
    /// Recognized: `COURIER_WORKFLOW_URL`, `COURIER_WORKFLOW_API_KEY`,
    /// `GEMINI_API_KEY` (or `API_KEY`), `COURIER_DEBUG`, `COURIER_MODE`.
    /// Blank values are ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("COURIER_WORKFLOW_URL") {
            self.workflow.endpoint = url;
        }
        if let Some(key) = get("COURIER_WORKFLOW_API_KEY") {
            self.workflow.api_key = key;
        }
        if let Some(key) = get("GEMINI_API_KEY").or_else(|| get("API_KEY")) {
            self.gemini.api_key = key;
        }
        if let Some(flag) = get("COURIER_DEBUG") {
            self.general.debug = matches!(
                flag.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
        if let Some(mode) = get("COURIER_MODE") {
            match mode.parse::<AiMode>() {
                Ok(m) => self.routing.mode = m,
                Err(e) => warn!(error = %e, "Ignoring COURIER_MODE"),
            }
        }
    }

    /// Effective log filter: the debug toggle wins over `log_level`.
    pub fn effective_log_level(&self) -> &str {
        if self.general.debug {
            "debug"
        } else {
            &self.general.log_level
        }
    }

    /// Data directory with a leading `~` expanded to the home directory.
    pub fn resolved_data_dir(&self) -> PathBuf {
        expand_home(&self.general.data_dir)
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory holding the persisted session id.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// Force debug logging regardless of `log_level`.
    pub debug: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.courier".to_string(),
            log_level: "info".to_string(),
            debug: false,
        }
    }
}

/// Routing policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub mode: AiMode,
}

/// Request shape expected by the workflow endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowVariant {
    /// `{chatInput, sessionId, action}` webhook body.
    #[default]
    N8n,
    /// `{text_message}` body with bearer authentication.
    CodeWords,
}

impl fmt::Display for WorkflowVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowVariant::N8n => write!(f, "n8n"),
            WorkflowVariant::CodeWords => write!(f, "code_words"),
        }
    }
}

/// Workflow automation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Webhook URL. Empty means the workflow backend is unconfigured.
    pub endpoint: String,
    /// Bearer credential (required by the `code_words` variant).
    pub api_key: String,
    pub variant: WorkflowVariant,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            variant: WorkflowVariant::N8n,
            timeout_secs: 20,
        }
    }
}

/// Generative model backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// API key. Empty means the model backend is unconfigured.
    pub api_key: String,
    pub model: String,
    /// REST base URL up to and including `/models`.
    pub base_url: String,
    pub system_instruction: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-2.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),
            system_instruction: "You are a helpful assistant. You are concise, friendly, and \
                precise. When the user asks you to send an email, call the send_email function \
                with the recipient, subject and body."
                .to_string(),
            timeout_secs: 20,
        }
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(rest)
    } else if path == "~" {
        PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
    } else {
        PathBuf::from(path)
    }
}
