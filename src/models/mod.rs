//! Data models for vmsnap.
//!
//! - [`ResolverConfig`]: ceilings and selection rules loaded from `vmsnap.yaml`
//! - [`SnapshotRecord`] / [`SnapshotTable`]: the parsed contents of a `.vmsd` file
//! - [`DiskChain`]: the resolved list of disk files, newest first
//!
//! Models carry no I/O. The table and chain are built once per resolution and
//! dropped with it.

pub mod chain;
pub mod config;
pub mod snapshot;

pub use chain::{DiskChain, Strategy};
pub use config::{
    ChainOrder, DiskSelection, FallbackMode, GroupingPolicy, Limits, ResolutionSettings,
    ResolverConfig, SnapshotSettings,
};
pub use snapshot::{SnapshotRecord, SnapshotTable};
