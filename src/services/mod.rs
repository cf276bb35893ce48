//! Services module - chain resolution logic.
//!
//! Everything that reads descriptor files and turns them into a disk chain.
//! The services have no knowledge of the command line and take all inputs as
//! explicit parameters.
//!
//! # Components
//!
//! - [`line_source`]: the [`FileSource`] seam and the [`LineSource`] line decoder
//! - [`extract`]: `key = "value"` extraction shared by every dialect
//! - [`disk_selector`]: picks the active hard disk from a `.vmx` file
//! - [`snapshot_table`]: groups `.vmsd` lines into snapshot records
//! - [`resolver`]: the metadata table walk and the disk header walk
//! - [`assembler`]: renders a chain into one bounded string
//!
//! # Usage Example
//!
//! ```ignore
//! use vmsnap::services::ChainResolver;
//! use vmsnap::models::ResolverConfig;
//! use camino::Utf8Path;
//!
//! let resolver = ChainResolver::new(ResolverConfig::default());
//! let resolution = resolver.resolve(Utf8Path::new("vms/win10/win10.vmx"))?;
//! println!("{}", resolver.render(&resolution)?);
//! ```

pub mod assembler;
pub mod disk_selector;
pub mod error;
pub mod extract;
pub mod line_source;
pub mod resolver;
pub mod snapshot_table;

pub use assembler::ChainOutputAssembler;
pub use disk_selector::select_active_disk;
pub use error::{ChainError, ChainErrorKind, ChainResult};
pub use extract::{KeyValue, extract_value};
pub use line_source::{FileSource, LineSource, LocalFiles};
pub use resolver::{ChainResolver, ChainWalk, Resolution, metadata_path, walk_snapshot_table};
pub use snapshot_table::SnapshotTableBuilder;

/// Copy a disk file name, rejecting names longer than `max_len` bytes.
pub(crate) fn bounded_disk_name(name: &str, max_len: usize) -> ChainResult<String> {
    if name.len() > max_len {
        return Err(ChainError::MalformedInput(format!(
            "disk name exceeds {} bytes: {}",
            max_len, name
        )));
    }
    Ok(name.to_string())
}
