//! Supervisor — owns the module registry and drives the lifecycle.
//!
//! [`Application::start`] runs a fixed sequence with a hard barrier between
//! steps; no module begins a step before every module finished the previous
//! one:
//!
//! 1. Load the fragment store (all configured layers) on the blocking pool.
//! 2. Attach a namespaced logger to every module.
//! 3. `init` on every module, concurrently.
//! 4. `init_module(other)` for every ordered pair of distinct modules, in
//!    registration order, one call at a time. This is n·(n-1) calls; modules
//!    see every peer, not only the ones they care about.
//! 5. `post_init` on every module, concurrently.
//!
//! [`Application::stop`] runs `stop` on every module concurrently.
//!
//! Hook failures follow the configured [`crate::config::FailurePolicy`].

mod phase;
pub mod registry;

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::AppError;
use crate::module::{Logger, Module, ModuleContext, ModuleHandle, Phase};
use crate::store::{ConfigStore, LoadReport};

use phase::PhaseRunner;
use registry::ModuleRegistry;

/// Where the application is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Accepting registrations; `start()` not called yet.
    Registering,
    Starting,
    Running,
    Stopped,
    /// A fail-fast phase aborted `start()`.
    Failed,
}

/// The orchestrator: one config store, one registry.
#[derive(Debug)]
pub struct Application {
    settings: Settings,
    store: Arc<ConfigStore>,
    registry: ModuleRegistry,
    state: LifecycleState,
    log: Logger,
    failures: Vec<AppError>,
    load_report: Option<LoadReport>,
}

impl Application {
    pub fn new(settings: Settings) -> Self {
        let store = Arc::new(ConfigStore::new(settings.fragment_format));
        Self {
            settings,
            store,
            registry: ModuleRegistry::default(),
            state: LifecycleState::Registering,
            log: Logger::new("app"),
            failures: Vec::new(),
            load_report: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Register `module` under `name`. Names are unique; a second
    /// registration under the same name is rejected.
    pub fn register<M: Module>(&mut self, name: &str, module: M) -> Result<(), AppError> {
        self.register_shared(name, Arc::new(module))
    }

    /// Like [`Application::register`], for a module the caller keeps a
    /// reference to.
    pub fn register_shared<M: Module>(&mut self, name: &str, module: Arc<M>) -> Result<(), AppError> {
        if self.state != LifecycleState::Registering {
            return Err(AppError::Lifecycle(format!(
                "cannot register '{name}': application is {:?}",
                self.state
            )));
        }
        if name.is_empty() {
            return Err(AppError::Lifecycle("module name must not be empty".into()));
        }
        let ctx = ModuleContext::new(name, self.store.clone());
        self.registry.insert(ModuleHandle::new(ctx, module))?;
        debug!(module = %name, "module registered");
        Ok(())
    }

    pub fn get_module(&self, name: &str) -> Option<&ModuleHandle> {
        self.registry.get(name)
    }

    /// The module registered under `name`, as its concrete type.
    pub fn downcast<T: Module>(&self, name: &str) -> Option<Arc<T>> {
        self.registry.get(name)?.downcast::<T>()
    }

    /// Registered names in registration order.
    pub fn module_names(&self) -> Vec<&str> {
        self.registry.names()
    }

    pub fn config(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    /// Read from the store. An empty path returns the whole store.
    pub fn get_config(&self, path: &str) -> Option<Value> {
        self.store.get(path)
    }

    pub fn get_config_or(&self, path: &str, default: impl Into<Value>) -> Value {
        self.store.get_or(path, default)
    }

    /// Hook failures recorded under [`crate::config::FailurePolicy::Isolate`].
    pub fn failures(&self) -> &[AppError] {
        &self.failures
    }

    /// Result of the config load performed by `start()`.
    pub fn load_report(&self) -> Option<&LoadReport> {
        self.load_report.as_ref()
    }

    /// Load config and bring every module up. See the module docs for the
    /// step sequence.
    pub async fn start(&mut self) -> Result<(), AppError> {
        if self.state != LifecycleState::Registering {
            return Err(AppError::Lifecycle(format!(
                "start() called while application is {:?}",
                self.state
            )));
        }
        self.state = LifecycleState::Starting;
        info!(
            modules = ?self.registry.names(),
            policy = %self.settings.failure_policy,
            "starting application"
        );

        // Directory walk and file reads are blocking I/O.
        let store = self.store.clone();
        let layers = self.settings.config_layers();
        let report = match tokio::task::spawn_blocking(move || store.load_layers(&layers)).await {
            Ok(report) => report,
            Err(e) => {
                self.state = LifecycleState::Failed;
                return Err(AppError::Lifecycle(format!("config load task failed: {e}")));
            }
        };
        for failure in &report.failed {
            self.log.error(&[&"Failed to load config", failure]);
        }
        self.load_report = Some(report);

        for handle in self.registry.handles() {
            if !handle.context().attach_logger(Logger::new(handle.name())) {
                debug!(module = %handle.name(), "logger already attached");
            }
        }

        let handles = self.registry.handles().to_vec();
        let pairs = self
            .registry
            .pairs()
            .into_iter()
            .map(|(module, other)| (module, Some(other)));

        let mut runner = PhaseRunner::new(self.settings.failure_policy, self.settings.hook_timeout);
        let result = async {
            runner.concurrent(Phase::Init, &handles).await?;
            runner.sequential(Phase::InitModule, pairs).await?;
            runner.concurrent(Phase::PostInit, &handles).await
        }
        .await;
        self.failures.extend(runner.into_failures());

        match result {
            Ok(()) => {
                self.state = LifecycleState::Running;
                if !self.failures.is_empty() {
                    warn!(failures = self.failures.len(), "application started with isolated failures");
                }
                info!(namespaces = ?self.store.namespaces(), "application started");
                Ok(())
            }
            Err(e) => {
                self.state = LifecycleState::Failed;
                Err(e)
            }
        }
    }

    /// Stop every module. A never-started or already stopped application
    /// is left as is.
    pub async fn stop(&mut self) -> Result<(), AppError> {
        match self.state {
            LifecycleState::Running | LifecycleState::Failed => {}
            state => {
                debug!(?state, "stop() ignored");
                return Ok(());
            }
        }
        info!("stopping application");

        let handles = self.registry.handles().to_vec();
        let mut runner = PhaseRunner::new(self.settings.failure_policy, self.settings.hook_timeout);
        let result = runner.concurrent(Phase::Stop, &handles).await;
        self.failures.extend(runner.into_failures());
        self.state = LifecycleState::Stopped;

        result?;
        info!("application stopped");
        Ok(())
    }
}

impl Default for Application {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}
