//! Public settings types.
//!
//! These are the resolved, ready-to-use structs the host consumes.
//! Raw TOML deserialization types live in `raw.rs`.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::store::FragmentFormat;

/// What the orchestrator does when a lifecycle hook fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Abort the running phase and return the error from `start()`/`stop()`.
    #[default]
    FailFast,
    /// Log and record the failure, then carry on with the other modules.
    Isolate,
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::FailFast => f.write_str("fail-fast"),
            FailurePolicy::Isolate => f.write_str("isolate"),
        }
    }
}

/// Fully-resolved host settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub name: String,
    pub log_level: String,
    /// Root of the fragment files (already expanded, no `~`).
    pub config_dir: PathBuf,
    /// Merged on top of `config_dir`, in order.
    pub overlay_dirs: Vec<PathBuf>,
    pub fragment_format: FragmentFormat,
    pub failure_policy: FailurePolicy,
    pub hook_timeout: Option<Duration>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            name: super::raw::default_name(),
            log_level: super::raw::default_log_level(),
            config_dir: PathBuf::from(super::raw::default_config_dir()),
            overlay_dirs: Vec::new(),
            fragment_format: FragmentFormat::default(),
            failure_policy: FailurePolicy::default(),
            hook_timeout: None,
        }
    }
}

impl Settings {
    /// All fragment directories in merge order.
    pub fn config_layers(&self) -> Vec<PathBuf> {
        std::iter::once(self.config_dir.clone())
            .chain(self.overlay_dirs.iter().cloned())
            .collect()
    }

    /// Default settings rooted at an explicit fragment directory.
    pub fn with_config_dir(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            ..Self::default()
        }
    }
}
