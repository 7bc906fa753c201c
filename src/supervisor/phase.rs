//! Phase runner — executes one lifecycle phase across modules.
//!
//! Every hook call runs in its own Tokio task so a panicking module is
//! reported as [`AppError::HookPanicked`] instead of tearing down the
//! orchestrator. Failures are routed through the configured
//! [`FailurePolicy`]:
//!
//! - `FailFast` — the first failure is returned once the phase ends. Hooks of
//!   a concurrent phase that are already running are left to finish, so a
//!   failing `stop` never cuts another module's shutdown short. A
//!   sequential phase stops issuing calls at the first failure.
//! - `Isolate` — the failure is logged and recorded, the phase carries on.
//!
//! When a hook timeout is configured, the hook future is dropped once the
//! limit elapses and the call fails with [`AppError::HookTimeout`].

use std::collections::HashMap;
use std::time::Duration;

use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error};

use crate::config::FailurePolicy;
use crate::error::AppError;
use crate::module::{ModuleHandle, Phase};

#[derive(Debug)]
pub(crate) struct PhaseRunner {
    policy: FailurePolicy,
    timeout: Option<Duration>,
    failures: Vec<AppError>,
}

impl PhaseRunner {
    pub(crate) fn new(policy: FailurePolicy, timeout: Option<Duration>) -> Self {
        Self {
            policy,
            timeout,
            failures: Vec::new(),
        }
    }

    /// Failures recorded under the `Isolate` policy.
    pub(crate) fn into_failures(self) -> Vec<AppError> {
        self.failures
    }

    /// Run `phase` on every module at once and wait for all of them, even
    /// after a failure.
    pub(crate) async fn concurrent(&mut self, phase: Phase, modules: &[ModuleHandle]) -> Result<(), AppError> {
        let mut set = JoinSet::new();
        let mut names = HashMap::new();

        for module in modules {
            debug!(module = %module.name(), %phase, "spawning hook");
            let task = set.spawn(call(module.clone(), phase, None, self.timeout));
            names.insert(task.id(), module.name().to_string());
        }

        let mut first_error = None;
        while let Some(joined) = set.join_next_with_id().await {
            let outcome = match joined {
                Ok((_, outcome)) => outcome,
                Err(e) => {
                    let module = names.get(&e.id()).cloned().unwrap_or_default();
                    Err(join_failure(e, module, phase))
                }
            };
            if let Err(e) = self.settle(phase, outcome) {
                if first_error.is_none() {
                    debug!(%phase, remaining = set.len(), "waiting for in-flight hooks");
                    first_error = Some(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Run `phase` for each call in order, one at a time.
    pub(crate) async fn sequential<I>(&mut self, phase: Phase, calls: I) -> Result<(), AppError>
    where
        I: IntoIterator<Item = (ModuleHandle, Option<ModuleHandle>)>,
    {
        for (module, peer) in calls {
            let name = module.name().to_string();
            if let Some(peer) = &peer {
                debug!(module = %name, peer = %peer.name(), %phase, "running hook");
            }
            let outcome = match tokio::spawn(call(module, phase, peer, self.timeout)).await {
                Ok(outcome) => outcome,
                Err(e) => Err(join_failure(e, name, phase)),
            };
            self.settle(phase, outcome)?;
        }
        Ok(())
    }

    fn settle(&mut self, phase: Phase, outcome: Result<(), AppError>) -> Result<(), AppError> {
        let Err(e) = outcome else {
            return Ok(());
        };
        error!(%phase, policy = %self.policy, error = %e, "lifecycle hook failed");
        match self.policy {
            FailurePolicy::FailFast => Err(e),
            FailurePolicy::Isolate => {
                self.failures.push(e);
                Ok(())
            }
        }
    }
}

async fn call(
    module: ModuleHandle,
    phase: Phase,
    peer: Option<ModuleHandle>,
    timeout: Option<Duration>,
) -> Result<(), AppError> {
    let hook = module.run(phase, peer.as_ref());
    let result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, hook).await {
            Ok(result) => result,
            Err(_) => {
                return Err(AppError::HookTimeout {
                    module: module.name().to_string(),
                    phase,
                    after: limit,
                });
            }
        },
        None => hook.await,
    };
    result.map_err(|source| AppError::Hook {
        module: module.name().to_string(),
        phase,
        source: Box::new(source),
    })
}

fn join_failure(e: JoinError, module: String, phase: Phase) -> AppError {
    if e.is_panic() {
        AppError::HookPanicked { module, phase }
    } else {
        AppError::Lifecycle(format!("{phase} hook of '{module}' was cancelled"))
    }
}
