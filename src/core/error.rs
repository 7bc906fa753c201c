//! Application-wide error types.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::module::Phase;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    /// One fragment file could not be read or parsed. Only surfaced through
    /// [`crate::store::LoadReport`]; a bad fragment never aborts a load.
    #[error("fragment error in {}: {message}", .path.display())]
    Fragment { path: PathBuf, message: String },

    #[error("module already registered: {0}")]
    DuplicateModule(String),

    #[error("lifecycle error: {0}")]
    Lifecycle(String),

    /// Raised by a module's own hook implementation.
    #[error("module error: {0}")]
    Module(String),

    #[error("module '{module}' failed during {phase}: {source}")]
    Hook {
        module: String,
        phase: Phase,
        #[source]
        source: Box<AppError>,
    },

    #[error("module '{module}' timed out during {phase} after {after:?}")]
    HookTimeout {
        module: String,
        phase: Phase,
        after: Duration,
    },

    #[error("module '{module}' panicked during {phase}")]
    HookPanicked { module: String, phase: Phase },

    #[error("logger error: {0}")]
    Logger(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Shorthand for hook implementations: `Err(AppError::module("no socket"))`.
    pub fn module(message: impl Into<String>) -> Self {
        AppError::Module(message.into())
    }

    /// Name of the module a lifecycle failure belongs to, if any.
    pub fn failed_module(&self) -> Option<&str> {
        match self {
            AppError::Hook { module, .. }
            | AppError::HookTimeout { module, .. }
            | AppError::HookPanicked { module, .. } => Some(module),
            _ => None,
        }
    }
}
