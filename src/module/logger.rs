//! Namespaced logger handed to every module.
//!
//! Each call space-joins its values, prefixes the bound (upper-cased) name
//! and emits the line as a `tracing` event at the matching level, so the
//! severity tag comes from the global subscriber.

use std::fmt;
use std::sync::Arc;

use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct Logger {
    name: Arc<str>,
}

impl Logger {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_uppercase().into(),
        }
    }

    /// The bound component name, upper-cased.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn info(&self, values: &[&dyn fmt::Display]) {
        info!(module = %self.name, "{}", self.line(values));
    }

    pub fn warn(&self, values: &[&dyn fmt::Display]) {
        warn!(module = %self.name, "{}", self.line(values));
    }

    pub fn error(&self, values: &[&dyn fmt::Display]) {
        error!(module = %self.name, "{}", self.line(values));
    }

    /// The line a log call would emit, without the severity tag.
    pub fn line(&self, values: &[&dyn fmt::Display]) -> String {
        let mut out = self.name.to_string();
        for value in values {
            out.push(' ');
            out.push_str(&value.to_string());
        }
        out
    }
}
