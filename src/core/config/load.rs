//! Settings loading with env-var overrides.
//!
//! Reads an optional TOML settings file and applies `MODHOST_CONFIG_DIR` and
//! `MODHOST_LOG_LEVEL` env overrides.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::AppError;

use super::raw::{RawHost, RawSettings};
use super::types::Settings;

const DEFAULT_SETTINGS_PATH: &str = "modhost.toml";

/// Load settings from the given path, or `modhost.toml` if it exists, then
/// apply env-var overrides. With neither, built-in defaults are used.
pub fn load(settings_path: Option<&str>) -> Result<Settings, AppError> {
    let config_dir_override = env::var("MODHOST_CONFIG_DIR").ok();
    let log_level_override = env::var("MODHOST_LOG_LEVEL").ok();

    if let Some(path) = settings_path {
        return load_from(
            Path::new(path),
            config_dir_override.as_deref(),
            log_level_override.as_deref(),
        );
    }

    let default_path = Path::new(DEFAULT_SETTINGS_PATH);
    if default_path.exists() {
        load_from(
            default_path,
            config_dir_override.as_deref(),
            log_level_override.as_deref(),
        )
    } else {
        Ok(resolve(
            RawHost::default(),
            config_dir_override.as_deref(),
            log_level_override.as_deref(),
        ))
    }
}

/// Internal loader — accepts an explicit path and optional overrides.
/// Tests pass overrides directly instead of mutating env vars.
pub fn load_from(
    path: &Path,
    config_dir_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Result<Settings, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let parsed: RawSettings = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    Ok(resolve(parsed.host, config_dir_override, log_level_override))
}

fn resolve(
    host: RawHost,
    config_dir_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Settings {
    let config_dir = expand_home(config_dir_override.unwrap_or(&host.config_dir));
    let log_level = log_level_override.unwrap_or(&host.log_level).to_string();

    Settings {
        name: host.name,
        log_level,
        config_dir,
        overlay_dirs: host.overlay_dirs.iter().map(|d| expand_home(d)).collect(),
        fragment_format: host.fragment_format,
        failure_policy: host.failure_policy,
        hook_timeout: host.hook_timeout_secs.map(Duration::from_secs),
    }
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}
