// vmsnap - Resolve the active virtual-disk snapshot chain of a virtual machine
//
// This is the library crate containing the parsing and chain resolution logic.
// The binary crate (main.rs) provides the command line entry point.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use models::{DiskChain, ResolverConfig, SnapshotRecord, SnapshotTable};
pub use services::{ChainError, ChainErrorKind, ChainResolver, Resolution};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
