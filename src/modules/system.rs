//! `system` module — reports what the host brought up.
//!
//! Registered by the binary so that a bare `modhost` run has something to
//! drive. It remembers every peer it is wired to and logs a summary once
//! the registry is fully wired. Its own namespace (`system.json`) may set:
//!
//! ```json
//! { "announce": true, "tags": ["edge", "eu-west"] }
//! ```

use std::sync::Mutex;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::AppError;
use crate::module::{Module, ModuleContext, ModuleHandle};

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SystemConfig {
    pub announce: bool,
    pub tags: Vec<String>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            announce: true,
            tags: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct SystemModule {
    config: Mutex<SystemConfig>,
    peers: Mutex<Vec<String>>,
}

impl SystemModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Peers seen during wiring, in wiring order.
    pub fn peers(&self) -> Vec<String> {
        self.peers.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn config(&self) -> SystemConfig {
        self.config.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Module for SystemModule {
    async fn init(&self, ctx: &ModuleContext) -> Result<(), AppError> {
        // A namespace that does not deserialize is a config error, not a miss.
        let parsed = match ctx.config().get("") {
            Some(value) => serde_json::from_value::<SystemConfig>(value)
                .map_err(|e| AppError::Config(format!("system: {e}")))?,
            None => SystemConfig::default(),
        };
        if let Ok(mut config) = self.config.lock() {
            *config = parsed;
        }
        Ok(())
    }

    async fn init_module(&self, _ctx: &ModuleContext, other: &ModuleHandle) -> Result<(), AppError> {
        if let Ok(mut peers) = self.peers.lock() {
            peers.push(other.name().to_string());
        }
        Ok(())
    }

    async fn post_init(&self, ctx: &ModuleContext) -> Result<(), AppError> {
        let config = self.config();
        if !config.announce {
            return Ok(());
        }
        let peers = self.peers();
        let namespaces = ctx.config().store().namespaces();
        let peer_list = if peers.is_empty() { "none".to_string() } else { peers.join(", ") };
        let ns_list = if namespaces.is_empty() { "none".to_string() } else { namespaces.join(", ") };
        ctx.log().info(&[&"peers:", &peer_list]);
        ctx.log().info(&[&"config namespaces:", &ns_list]);
        if !config.tags.is_empty() {
            ctx.log().info(&[&"tags:", &config.tags.join(", ")]);
        }
        Ok(())
    }

    async fn stop(&self, ctx: &ModuleContext) -> Result<(), AppError> {
        ctx.log().info(&[&"shutting down"]);
        Ok(())
    }
}
