//! Bootstrap layer — runs before any module is touched.
//!
//! - **logger** — tracing-subscriber initialisation.

pub mod logger;
