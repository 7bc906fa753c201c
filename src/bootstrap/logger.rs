//! Logging initialisation via tracing-subscriber.
//!
//! Call [`init`] once at startup, after settings are resolved.

use std::path::Path;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::error::AppError;

/// Initialise the global tracing subscriber.
///
/// `level` is a filter directive, usually a bare level (`"info"`, `"debug"`)
/// or a per-target list (`"modhost=debug,warn"`).
///
/// If `prefer_level` is `true` (a `-v` flag was given), `level` wins and
/// `RUST_LOG` is only consulted when `level` does not parse. Otherwise
/// `RUST_LOG` wins and `level` is the fallback.
pub fn init(level: &str, prefer_level: bool, log_file: Option<&Path>) -> Result<(), AppError> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = resolve_filter(level, prefer_level, rust_log.as_deref())?;

    let writer = match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    AppError::Logger(format!("failed to open log file '{}': {e}", path.display()))
                })?;
            BoxMakeWriter::new(std::sync::Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .try_init()
        .map_err(|e| AppError::Logger(format!("failed to set subscriber: {e}")))?;

    Ok(())
}

/// Pick the filter from `level` and the `RUST_LOG` value, in precedence order.
fn resolve_filter(level: &str, prefer_level: bool, rust_log: Option<&str>) -> Result<EnvFilter, AppError> {
    let from_env = || match rust_log {
        Some(directives) => EnvFilter::try_new(directives)
            .map_err(|e| format!("RUST_LOG '{directives}' does not parse: {e}")),
        None => Err("RUST_LOG not set".to_string()),
    };

    if prefer_level {
        EnvFilter::try_new(level).or_else(|level_err| {
            from_env().map_err(|env_err| {
                AppError::Logger(format!("invalid log level '{level}': {level_err}; {env_err}"))
            })
        })
    } else {
        from_env()
            .or_else(|_| EnvFilter::try_new(level))
            .map_err(|e| AppError::Logger(format!("invalid log level '{level}': {e}")))
    }
}
