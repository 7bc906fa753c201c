// Library root — the orchestrator, config store and module contract.
// The binary entry point is src/main.rs.

pub mod bootstrap;
pub mod core;
pub mod module;
pub mod modules;
pub mod store;
pub mod supervisor;

pub use bootstrap::logger;
pub use self::core::{config, error};

pub use error::AppError;
pub use module::{Logger, Module, ModuleContext, ModuleHandle, Phase, ScopedConfig};
pub use store::{ConfigStore, FragmentFormat, LoadReport};
pub use supervisor::{Application, LifecycleState};
