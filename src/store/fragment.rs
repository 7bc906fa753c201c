//! Fragment files — format detection, parsing and namespace key derivation.

use std::fmt;
use std::path::{Component, Path};

use serde::Deserialize;
use serde_json::Value;

/// On-disk syntax of fragment files. One format is active per store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentFormat {
    #[default]
    Json,
    Toml,
}

impl FragmentFormat {
    /// File extension (without the dot) that selects fragments of this format.
    pub fn extension(self) -> &'static str {
        match self {
            FragmentFormat::Json => "json",
            FragmentFormat::Toml => "toml",
        }
    }

    /// `true` if `path` carries this format's extension.
    pub fn matches(self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(self.extension()))
    }

    /// Parse fragment text into the shared value model.
    pub fn parse(self, text: &str) -> Result<Value, String> {
        match self {
            FragmentFormat::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
            FragmentFormat::Toml => toml::from_str(text).map_err(|e| e.to_string()),
        }
    }
}

impl fmt::Display for FragmentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Derive the namespace key for a fragment at `relative` (relative to the
/// scan root): path components joined with `/`, final extension stripped.
///
/// `db.json` → `db`, `db.local.json` → `db.local`, `nested/cache.json` →
/// `nested/cache`.
pub fn namespace_key(relative: &Path) -> Option<String> {
    let stripped = relative.with_extension("");
    let parts: Vec<String> = stripped
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if parts.is_empty() || parts.iter().any(String::is_empty) {
        return None;
    }
    Some(parts.join("/"))
}
