use serde::{Deserialize, Serialize};

/// Resolver settings loaded from `vmsnap.yaml`.
///
/// Every ceiling the resolver enforces lives here so tests and operators can
/// tighten or relax them without touching code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default)]
    pub limits: Limits,

    #[serde(default)]
    pub selection: DiskSelection,

    #[serde(default)]
    pub snapshots: SnapshotSettings,

    #[serde(default)]
    pub resolution: ResolutionSettings,
}

/// Resource ceilings applied while parsing and walking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Limits {
    /// Maximum distinct snapshot entries in a metadata file.
    #[serde(default = "default_max_snapshots")]
    pub max_snapshots: usize,

    /// Maximum disk-header hops before the walk is abandoned.
    #[serde(default = "default_max_chain_depth")]
    pub max_chain_depth: usize,

    /// Rendered chain size in bytes, counting separators and the trailing NUL.
    #[serde(default = "default_output_capacity")]
    pub output_capacity: usize,

    /// Longest accepted disk file name.
    #[serde(default = "default_max_disk_name_len")]
    pub max_disk_name_len: usize,

    /// Binary preamble skipped before a disk image's text descriptor.
    #[serde(default = "default_descriptor_offset")]
    pub descriptor_offset: u64,

    /// Bytes scanned after the preamble before giving up on the descriptor.
    #[serde(default = "default_max_descriptor_bytes")]
    pub max_descriptor_bytes: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_snapshots: default_max_snapshots(),
            max_chain_depth: default_max_chain_depth(),
            output_capacity: default_output_capacity(),
            max_disk_name_len: default_max_disk_name_len(),
            descriptor_offset: default_descriptor_offset(),
            max_descriptor_bytes: default_max_descriptor_bytes(),
        }
    }
}

/// Which machine-descriptor attachments count as hard disks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskSelection {
    #[serde(default = "default_bus_prefixes")]
    pub bus_prefixes: Vec<String>,

    #[serde(default = "default_removable_extensions")]
    pub removable_extensions: Vec<String>,
}

impl Default for DiskSelection {
    fn default() -> Self {
        Self {
            bus_prefixes: default_bus_prefixes(),
            removable_extensions: default_removable_extensions(),
        }
    }
}

impl DiskSelection {
    /// True if the key starts with one of the storage controller buses.
    pub fn is_controller_key(&self, line: &str) -> bool {
        self.bus_prefixes.iter().any(|bus| line.starts_with(bus.as_str()))
    }

    /// True if the value names optical or floppy media.
    pub fn is_removable(&self, file_name: &str) -> bool {
        self.removable_extensions.iter().any(|ext| {
            file_name.len() >= ext.len()
                && file_name.is_char_boundary(file_name.len() - ext.len())
                && file_name[file_name.len() - ext.len()..].eq_ignore_ascii_case(ext)
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSettings {
    #[serde(default)]
    pub grouping: GroupingPolicy,
}

/// How `snapshotN.*` lines are collected into records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum GroupingPolicy {
    /// A record ends whenever the entry id differs from the previous line's.
    /// Interleaved ids therefore produce repeated records.
    #[default]
    Contiguous,
    /// Lines are grouped by entry id regardless of where they appear.
    FirstSeen,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolutionSettings {
    #[serde(default)]
    pub fallback: FallbackMode,

    #[serde(default)]
    pub order: ChainOrder,
}

/// What to do when the machine has no snapshot metadata file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum FallbackMode {
    /// Follow `parentFileNameHint` through the disk images themselves.
    #[default]
    DiskHeaderWalk,
    /// Report the active disk alone.
    ActiveDiskOnly,
}

/// Presentation order of the rendered chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ChainOrder {
    /// Base image first, active disk last.
    #[default]
    OldestFirst,
    /// Active disk first, base image last.
    NewestFirst,
}

fn default_max_snapshots() -> usize {
    20
}

fn default_max_chain_depth() -> usize {
    20
}

fn default_output_capacity() -> usize {
    1024
}

fn default_max_disk_name_len() -> usize {
    255
}

fn default_descriptor_offset() -> u64 {
    512
}

fn default_max_descriptor_bytes() -> u64 {
    0x4000
}

fn default_bus_prefixes() -> Vec<String> {
    ["ide", "sata", "scsi", "nvme"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_removable_extensions() -> Vec<String> {
    vec!["iso".to_string(), "flp".to_string()]
}
