//! Module contract — the shape every pluggable unit implements.
//!
//! A module is registered under a unique name and driven through four
//! lifecycle hooks by [`crate::supervisor::Application`]:
//!
//! 1. [`Module::init`] — one-time setup that needs no other module.
//! 2. [`Module::init_module`] — called once per other registered module, in
//!    both directions, after every `init` has finished. Modules that have no
//!    relationship with the peer simply return `Ok(())`.
//! 3. [`Module::post_init`] — runs once the whole registry is wired.
//! 4. [`Module::stop`] — graceful shutdown.
//!
//! All hooks default to no-ops. Hooks take `&self`; modules that keep peer
//! references or connections do so behind interior mutability.
//!
//! Peers arrive as [`ModuleHandle`]s, which can be cloned and stored and
//! downcast to the concrete module type.

mod context;
mod logger;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AppError;

pub use context::{ModuleContext, ScopedConfig};
pub use logger::Logger;

/// Lifecycle phase a hook belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Init,
    InitModule,
    PostInit,
    Stop,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Init => "init",
            Phase::InitModule => "init_module",
            Phase::PostInit => "post_init",
            Phase::Stop => "stop",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pluggable unit driven by the orchestrator.
#[async_trait]
pub trait Module: Any + Send + Sync {
    async fn init(&self, _ctx: &ModuleContext) -> Result<(), AppError> {
        Ok(())
    }

    async fn init_module(&self, _ctx: &ModuleContext, _other: &ModuleHandle) -> Result<(), AppError> {
        Ok(())
    }

    async fn post_init(&self, _ctx: &ModuleContext) -> Result<(), AppError> {
        Ok(())
    }

    async fn stop(&self, _ctx: &ModuleContext) -> Result<(), AppError> {
        Ok(())
    }
}

/// A registered module together with its context.
#[derive(Clone)]
pub struct ModuleHandle {
    ctx: ModuleContext,
    module: Arc<dyn Module>,
    // Same allocation as `module`, kept for downcasting.
    any: Arc<dyn Any + Send + Sync>,
}

impl ModuleHandle {
    pub(crate) fn new<M: Module>(ctx: ModuleContext, module: Arc<M>) -> Self {
        Self {
            ctx,
            any: module.clone(),
            module,
        }
    }

    pub fn name(&self) -> &str {
        self.ctx.name()
    }

    pub fn context(&self) -> &ModuleContext {
        &self.ctx
    }

    pub fn config(&self) -> &ScopedConfig {
        self.ctx.config()
    }

    pub fn log(&self) -> &Logger {
        self.ctx.log()
    }

    pub fn module(&self) -> &Arc<dyn Module> {
        &self.module
    }

    /// `true` if the module is a `T`.
    pub fn is<T: Module>(&self) -> bool {
        self.any.is::<T>()
    }

    /// Borrow the module as its concrete type.
    pub fn downcast_ref<T: Module>(&self) -> Option<&T> {
        self.any.downcast_ref::<T>()
    }

    /// A shared reference to the concrete module, suitable for keeping.
    pub fn downcast<T: Module>(&self) -> Option<Arc<T>> {
        self.any.clone().downcast::<T>().ok()
    }

    pub(crate) async fn run(&self, phase: Phase, other: Option<&ModuleHandle>) -> Result<(), AppError> {
        match (phase, other) {
            (Phase::Init, _) => self.module.init(&self.ctx).await,
            (Phase::InitModule, Some(other)) => self.module.init_module(&self.ctx, other).await,
            (Phase::InitModule, None) => Err(AppError::Lifecycle(format!(
                "init_module on '{}' requires a peer",
                self.name()
            ))),
            (Phase::PostInit, _) => self.module.post_init(&self.ctx).await,
            (Phase::Stop, _) => self.module.stop(&self.ctx).await,
        }
    }
}

impl fmt::Debug for ModuleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleHandle").field("name", &self.name()).finish_non_exhaustive()
    }
}
