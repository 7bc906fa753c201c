//! Per-module context: name, scoped config accessor and logger.

use std::sync::{Arc, OnceLock};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::store::ConfigStore;

use super::logger::Logger;

/// Read access to the fragment store, rooted at one module's namespace.
///
/// `get("port")` on a module named `api` reads `api.port` from the store with
/// the store's miss semantics; an empty path reads the whole namespace.
#[derive(Debug, Clone)]
pub struct ScopedConfig {
    prefix: Arc<str>,
    store: Arc<ConfigStore>,
}

impl ScopedConfig {
    pub fn new(prefix: &str, store: Arc<ConfigStore>) -> Self {
        Self {
            prefix: prefix.into(),
            store,
        }
    }

    fn qualify(&self, path: &str) -> String {
        if path.is_empty() {
            self.prefix.to_string()
        } else {
            format!("{}.{path}", self.prefix)
        }
    }

    pub fn get(&self, path: &str) -> Option<Value> {
        self.store.get(&self.qualify(path))
    }

    pub fn get_or(&self, path: &str, default: impl Into<Value>) -> Value {
        self.store.get_or(&self.qualify(path), default)
    }

    pub fn get_as<T: DeserializeOwned>(&self, path: &str) -> Option<T> {
        self.store.get_as(&self.qualify(path))
    }

    /// The unscoped store, for reads outside this module's namespace.
    pub fn store(&self) -> &ConfigStore {
        &self.store
    }
}

#[derive(Debug)]
struct ContextInner {
    name: Arc<str>,
    config: ScopedConfig,
    log: OnceLock<Logger>,
}

/// Everything a module knows about itself, handed to each lifecycle hook.
///
/// Created by the orchestrator at registration; the logger is attached during
/// `start()` before any `init` runs. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct ModuleContext {
    inner: Arc<ContextInner>,
}

impl ModuleContext {
    pub fn new(name: &str, store: Arc<ConfigStore>) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                name: name.into(),
                config: ScopedConfig::new(name, store),
                log: OnceLock::new(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn config(&self) -> &ScopedConfig {
        &self.inner.config
    }

    /// The module's logger. Falls back to a logger bound to the module name
    /// if none was attached yet.
    pub fn log(&self) -> &Logger {
        self.inner.log.get_or_init(|| Logger::new(&self.inner.name))
    }

    /// Attach the logger. Returns `false` if one is already attached.
    pub(crate) fn attach_logger(&self, logger: Logger) -> bool {
        self.inner.log.set(logger).is_ok()
    }
}
