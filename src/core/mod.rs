//! Core infrastructure — shared foundation used across the whole crate.
//!
//! - **config** — host settings loading and resolved types.
//! - **error** — application-wide error enum.

pub mod config;
pub mod error;
