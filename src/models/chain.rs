use std::fmt;

/// Disk file names making up one virtual disk, newest first.
///
/// The active disk is always at index 0 and the base image, once resolved,
/// at the end. A chain is never empty. Presentation order is decided when rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskChain {
    disks: Vec<String>,
}

impl DiskChain {
    pub fn new(active_disk: impl Into<String>) -> Self {
        Self {
            disks: vec![active_disk.into()],
        }
    }

    /// Append the next older ancestor.
    pub fn push_ancestor(&mut self, disk: impl Into<String>) {
        self.disks.push(disk.into());
    }

    pub fn active_disk(&self) -> &str {
        &self.disks[0]
    }

    /// Entries from the active disk down to the base image.
    pub fn newest_first(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.disks.iter().map(String::as_str)
    }

    /// Entries from the base image up to the active disk.
    pub fn oldest_first(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.newest_first().rev()
    }

    pub fn len(&self) -> usize {
        self.disks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.disks.is_empty()
    }
}

/// Which algorithm produced a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    MetadataTableWalk,
    DiskHeaderWalk,
    ActiveDiskOnly,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::MetadataTableWalk => "metadata table walk",
            Strategy::DiskHeaderWalk => "disk header walk",
            Strategy::ActiveDiskOnly => "active disk only",
        };
        f.write_str(name)
    }
}
