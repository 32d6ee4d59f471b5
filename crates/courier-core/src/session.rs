//! Session identifier and its file-backed store.
//!
//! The identifier correlates workflow calls belonging to one conversation.
//! It is created once, persisted, and only replaced by an explicit reset.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::Utc;
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{CourierError, Result};

/// Length of the random suffix in a generated identifier.
const RANDOM_SUFFIX_LEN: usize = 9;

/// Opaque session identifier, format `session_<millis>_<random>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh identifier.
    pub fn generate() -> Self {
        let suffix: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(RANDOM_SUFFIX_LEN)
            .map(char::from)
            .collect::<String>()
            .to_ascii_lowercase();
        Self(format!(
            "session_{}_{}",
            Utc::now().timestamp_millis(),
            suffix
        ))
    }

    /// Wrap an existing identifier. Blank input is rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persists the session identifier in a single file.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store rooted in a data directory (`<data_dir>/session`).
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join("session"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored identifier, creating and persisting one on first use.
    ///
    /// An empty or unreadable file is replaced with a fresh identifier.
    pub fn load_or_create(&self) -> Result<SessionId> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                if let Some(id) = SessionId::parse(&content) {
                    return Ok(id);
                }
                warn!(path = %self.path.display(), "Stored session id is invalid, regenerating");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read session id, regenerating");
            }
        }
        let id = SessionId::generate();
        self.write(&id)?;
        info!(session_id = %id, "Created new session");
        Ok(id)
    }

    /// Replace the stored identifier with a fresh one.
    pub fn reset(&self) -> Result<SessionId> {
        let id = SessionId::generate();
        self.write(&id)?;
        info!(session_id = %id, "Session reset");
        Ok(id)
    }

    fn write(&self, id: &SessionId) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, id.as_str()).map_err(|e| {
            CourierError::Session(format!(
                "failed to persist session id to {}: {}",
                self.path.display(),
                e
            ))
        })
    }
}
