//! Snapshot metadata (`.vmsd`) parsing.
//!
//! A `.vmsd` file is a flat list of lines such as
//!
//! ```text
//! snapshot.current = "2"
//! snapshot0.uid = "1"
//! snapshot0.disk0.fileName = "base.vmdk"
//! snapshot1.uid = "2"
//! snapshot1.parent = "1"
//! ```
//!
//! [`SnapshotTableBuilder`] groups the `snapshotN.*` lines into
//! [`SnapshotRecord`]s and keeps `snapshot.current`.

use super::bounded_disk_name;
use super::error::{ChainError, ChainResult};
use super::extract::KeyValue;
use crate::models::{GroupingPolicy, SnapshotRecord, SnapshotTable};
use indexmap::IndexMap;
use indexmap::map::Entry;
use regex::Regex;
use std::io;

/// General settings share this prefix with entries, minus the digit.
const GENERAL_PREFIX: &str = "snapshot.";
const CURRENT_KEY: &str = "snapshot.current";

/// Builds a [`SnapshotTable`] from `.vmsd` lines.
pub struct SnapshotTableBuilder {
    /// Captures the entry id (`snapshot12`) and the rest of the line after its dot.
    entry_pattern: Regex,
    grouping: GroupingPolicy,
    max_snapshots: usize,
    max_name_len: usize,
}

impl SnapshotTableBuilder {
    pub fn new(grouping: GroupingPolicy, max_snapshots: usize, max_name_len: usize) -> Self {
        Self {
            entry_pattern: Regex::new(r"^(snapshot[0-9][^.]*)\.(.*)$")
                .expect("Invalid snapshot entry regex"),
            grouping,
            max_snapshots,
            max_name_len,
        }
    }

    /// Parse every line into a table.
    ///
    /// Only `snapshot.current` is kept from the general settings. Entry fields
    /// other than `disk0.fileName`, `uid`, `displayName` and `parent` are
    /// ignored, as are field lines whose value cannot be extracted.
    ///
    /// # Errors
    ///
    /// - [`ChainError::ResourceExceeded`] when more than `max_snapshots`
    ///   records would be created
    /// - [`ChainError::MalformedInput`] for an over-long disk name
    /// - [`ChainError::Io`] if reading a line fails
    pub fn build<I>(&self, lines: I) -> ChainResult<SnapshotTable>
    where
        I: IntoIterator<Item = io::Result<String>>,
    {
        let mut entries = match self.grouping {
            GroupingPolicy::Contiguous => Entries::Contiguous(Vec::new()),
            GroupingPolicy::FirstSeen => Entries::FirstSeen(IndexMap::new()),
        };
        let mut current_uid = String::new();

        for line in lines {
            let line = line?;

            if line.starts_with(GENERAL_PREFIX) {
                if let Some(kv) = KeyValue::parse(&line) {
                    if kv.key == CURRENT_KEY {
                        current_uid = kv.value.to_string();
                        tracing::debug!("Found snapshot.current: {}", current_uid);
                    }
                }
                continue;
            }

            let Some(caps) = self.entry_pattern.captures(&line) else {
                continue;
            };
            let (Some(entry_id), Some(field)) = (caps.get(1), caps.get(2)) else {
                continue;
            };

            let record = entries.record(entry_id.as_str(), self.max_snapshots)?;

            let Some(kv) = KeyValue::parse(field.as_str()) else {
                continue;
            };
            match kv.key {
                "disk0.fileName" => {
                    record.disk_name = bounded_disk_name(kv.value, self.max_name_len)?
                }
                "uid" => record.uid = kv.value.to_string(),
                "displayName" => record.display_name = kv.value.to_string(),
                "parent" => record.parent_uid = kv.value.to_string(),
                _ => {}
            }
        }

        let records = entries.into_records();
        for record in &records {
            tracing::debug!("Found node entry: {}", record);
        }

        Ok(SnapshotTable {
            records,
            current_uid,
        })
    }
}

/// Records under construction, grouped per [`GroupingPolicy`].
enum Entries {
    Contiguous(Vec<SnapshotRecord>),
    FirstSeen(IndexMap<String, SnapshotRecord>),
}

impl Entries {
    /// The record a line for `entry_id` belongs to, opening one if needed.
    fn record(&mut self, entry_id: &str, limit: usize) -> ChainResult<&mut SnapshotRecord> {
        match self {
            Entries::Contiguous(records) => {
                let same_entry = records.last().is_some_and(|r| r.entry_id == entry_id);
                if !same_entry {
                    if records.len() >= limit {
                        return Err(too_many_entries(limit));
                    }
                    tracing::debug!("Enter new snapshot entry: {}", entry_id);
                    records.push(SnapshotRecord::new(entry_id));
                }
                let last = records.len() - 1;
                Ok(&mut records[last])
            }
            Entries::FirstSeen(records) => {
                let count = records.len();
                match records.entry(entry_id.to_string()) {
                    Entry::Occupied(slot) => Ok(slot.into_mut()),
                    Entry::Vacant(slot) => {
                        if count >= limit {
                            return Err(too_many_entries(limit));
                        }
                        tracing::debug!("Enter new snapshot entry: {}", entry_id);
                        Ok(slot.insert(SnapshotRecord::new(entry_id)))
                    }
                }
            }
        }
    }

    fn into_records(self) -> Vec<SnapshotRecord> {
        match self {
            Entries::Contiguous(records) => records,
            Entries::FirstSeen(records) => records.into_values().collect(),
        }
    }
}

fn too_many_entries(limit: usize) -> ChainError {
    ChainError::ResourceExceeded {
        what: "snapshot entries",
        limit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::error::ChainErrorKind;

    fn build(text: &str, grouping: GroupingPolicy) -> ChainResult<SnapshotTable> {
        SnapshotTableBuilder::new(grouping, 20, 255)
            .build(text.lines().map(|l| Ok::<_, io::Error>(l.to_string())))
    }

    const VMSD: &str = r#".encoding = "UTF-8"
snapshot.lastUID = "2"
snapshot.current = "2"
snapshot.numSnapshots = "2"
snapshot0.uid = "1"
snapshot0.filename = "vm-Snapshot1.vmsn"
snapshot0.displayName = "clean install"
snapshot0.type = "1"
snapshot0.numDisks = "1"
snapshot0.disk0.fileName = "vm.vmdk"
snapshot0.disk0.node = "scsi0:0"
snapshot1.uid = "2"
snapshot1.parent = "1"
snapshot1.displayName = "after updates"
snapshot1.disk0.fileName = "vm-000001.vmdk"
"#;

    #[test]
    fn test_builds_records_in_file_order() {
        let table = build(VMSD, GroupingPolicy::Contiguous).unwrap();
        assert_eq!(table.current_uid, "2");
        assert_eq!(table.len(), 2);

        let first = &table.records[0];
        assert_eq!(first.entry_id, "snapshot0");
        assert_eq!(first.uid, "1");
        assert!(first.is_root());
        assert_eq!(first.display_name, "clean install");
        assert_eq!(first.disk_name, "vm.vmdk");

        let second = &table.records[1];
        assert_eq!(second.entry_id, "snapshot1");
        assert_eq!(second.parent_uid, "1");
        assert_eq!(second.disk_name, "vm-000001.vmdk");
    }

    #[test]
    fn test_general_lines_other_than_current_are_ignored() {
        let text = "snapshot.lastUID = \"7\"\nsnapshot.currentish = \"9\"\n";
        let table = build(text, GroupingPolicy::Contiguous).unwrap();
        assert_eq!(table.current_uid, "");
        assert!(table.is_empty());
    }

    #[test]
    fn test_interleaved_ids_contiguous_policy() {
        let text = concat!(
            "snapshot0.uid = \"1\"\n",
            "snapshot1.uid = \"2\"\n",
            "snapshot0.disk0.fileName = \"a.vmdk\"\n",
        );
        let table = build(text, GroupingPolicy::Contiguous).unwrap();
        let ids: Vec<&str> = table.records.iter().map(|r| r.entry_id.as_str()).collect();
        assert_eq!(ids, vec!["snapshot0", "snapshot1", "snapshot0"]);
        assert_eq!(table.records[0].disk_name, "");
        assert_eq!(table.records[2].disk_name, "a.vmdk");
    }

    #[test]
    fn test_interleaved_ids_first_seen_policy() {
        let text = concat!(
            "snapshot0.uid = \"1\"\n",
            "snapshot1.uid = \"2\"\n",
            "snapshot0.disk0.fileName = \"a.vmdk\"\n",
        );
        let table = build(text, GroupingPolicy::FirstSeen).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.records[0].uid, "1");
        assert_eq!(table.records[0].disk_name, "a.vmdk");
        assert_eq!(table.records[1].uid, "2");
    }

    #[test]
    fn test_snapshot_ceiling() {
        let mut text = String::new();
        for i in 0..21 {
            text.push_str(&format!("snapshot{}.uid = \"{}\"\n", i, i + 1));
        }
        let err = build(&text, GroupingPolicy::Contiguous).unwrap_err();
        assert_eq!(err.kind(), ChainErrorKind::ResourceExceeded);

        let err = build(&text, GroupingPolicy::FirstSeen).unwrap_err();
        assert_eq!(err.kind(), ChainErrorKind::ResourceExceeded);

        let exactly_twenty: String = text.lines().take(20).map(|l| format!("{}\n", l)).collect();
        assert_eq!(build(&exactly_twenty, GroupingPolicy::Contiguous).unwrap().len(), 20);
    }

    #[test]
    fn test_entry_without_dot_is_ignored() {
        let table =
            build("snapshot3\nsnapshot3.uid = \"5\"\n", GroupingPolicy::Contiguous).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.records[0].uid, "5");
    }

    #[test]
    fn test_unextractable_field_still_opens_entry() {
        let table = build("snapshot4.uid = \"5\n", GroupingPolicy::Contiguous).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.records[0].entry_id, "snapshot4");
        assert_eq!(table.records[0].uid, "");
    }
}
