//! Host settings loading with env-var overrides.
//!
//! Reads `modhost.toml` relative to the current working directory (or an
//! explicit `-f` path), then applies `MODHOST_CONFIG_DIR` and
//! `MODHOST_LOG_LEVEL` env overrides. These settings only describe the host
//! itself; module configuration lives in the fragment store
//! ([`crate::store::ConfigStore`]).
//!
//! # Module layout
//!
//! - **types** — `Settings`, `FailurePolicy`.
//! - **raw** — Raw TOML deserialization types; kept private.
//! - **load** — `load`, `load_from`, `expand_home`.

mod load;
mod raw;
mod types;

pub use load::{expand_home, load, load_from};
pub use types::*;
