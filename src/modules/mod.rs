//! Built-in modules shipped with the host binary.

pub mod system;

pub use system::SystemModule;
