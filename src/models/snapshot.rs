use std::fmt;

/// One `snapshotN` entry from a `.vmsd` file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotRecord {
    /// Entry prefix as written in the file, e.g. `snapshot3`.
    pub entry_id: String,
    pub uid: String,
    /// Empty for a root snapshot.
    pub parent_uid: String,
    pub display_name: String,
    pub disk_name: String,
}

impl SnapshotRecord {
    pub fn new(entry_id: impl Into<String>) -> Self {
        Self {
            entry_id: entry_id.into(),
            ..Self::default()
        }
    }

    /// A record with no parent terminates any walk through it.
    pub fn is_root(&self) -> bool {
        self.parent_uid.is_empty()
    }
}

impl fmt::Display for SnapshotRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} uid: {}, parent: {}, name: {}, disk: {}",
            self.entry_id, self.uid, self.parent_uid, self.display_name, self.disk_name
        )
    }
}

/// Parsed snapshot metadata: records in file order plus the current uid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotTable {
    pub records: Vec<SnapshotRecord>,
    pub current_uid: String,
}

impl SnapshotTable {
    /// First record carrying `uid`.
    pub fn find(&self, uid: &str) -> Option<&SnapshotRecord> {
        self.records.iter().find(|record| record.uid == uid)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
