//! Raw TOML deserialization types.
//!
//! These structs mirror the settings file shape and use `serde` defaults.
//! The `load` module converts them into the public `types` structs.

use serde::Deserialize;

use crate::store::FragmentFormat;

use super::types::FailurePolicy;

/// Raw TOML shape — serde target before resolution.
#[derive(Deserialize, Default)]
pub(super) struct RawSettings {
    #[serde(default)]
    pub host: RawHost,
}

#[derive(Deserialize)]
pub(super) struct RawHost {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_config_dir")]
    pub config_dir: String,
    /// Extra fragment directories merged on top of `config_dir`, in order.
    #[serde(default)]
    pub overlay_dirs: Vec<String>,
    #[serde(default)]
    pub fragment_format: FragmentFormat,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    /// Absent means hooks may run forever.
    #[serde(default)]
    pub hook_timeout_secs: Option<u64>,
}

impl Default for RawHost {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: default_log_level(),
            config_dir: default_config_dir(),
            overlay_dirs: Vec::new(),
            fragment_format: FragmentFormat::default(),
            failure_policy: FailurePolicy::default(),
            hook_timeout_secs: None,
        }
    }
}

pub(super) fn default_name() -> String {
    "modhost".to_string()
}

pub(super) fn default_log_level() -> String {
    "info".to_string()
}

pub(super) fn default_config_dir() -> String {
    "config".to_string()
}
