//! Application configuration.
//!
//! The configuration is loaded from a JSON file, by default
//! `$XDG_CONFIG_HOME/wsswitch/config.json`.  Every section is optional so
//! new sections can be added without breaking older files.
//!
//! # Example
//!
//! ```json
//! {
//!   "workspaces": {
//!     "max_workspaces": 16,
//!     "pending_timeout_ms": 2000,
//!     "on_concurrent_request": "replace"
//!   },
//!   "bindings": {
//!     "h": "workspace-previous",
//!     "l": "workspace-next",
//!     "kp-insert": "unbound"
//!   }
//! }
//! ```

use crate::input::{Binding, Key};
use crate::pending::ConcurrentRequestPolicy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Top-level configuration.
///
/// A minimal `{}` file is valid and all sections fall back to their
/// compiled-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Workspace creation limits and deferred-completion behaviour.
    #[serde(default)]
    pub workspaces: WorkspaceConfig,

    /// Key binding overrides, layered over the built-in keymap.
    #[serde(default)]
    pub bindings: HashMap<Key, Binding>,
}

/// Workspace creation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Upper bound on the workspace count; new-workspace requests at the
    /// limit are refused.
    pub max_workspaces: usize,
    /// Abandon a pending workspace creation after this many milliseconds.
    /// `null` waits forever.
    pub pending_timeout_ms: Option<u64>,
    /// What a new-workspace request does while another is still pending.
    pub on_concurrent_request: ConcurrentRequestPolicy,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            max_workspaces: 36,
            pending_timeout_ms: None,
            on_concurrent_request: ConcurrentRequestPolicy::default(),
        }
    }
}

impl WorkspaceConfig {
    pub fn pending_timeout(&self) -> Option<Duration> {
        self.pending_timeout_ms.map(Duration::from_millis)
    }
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        Ok(config)
    }
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);
