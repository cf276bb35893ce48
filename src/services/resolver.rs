//! Disk chain resolution.
//!
//! [`ChainResolver::resolve`] finds the active disk in a machine descriptor,
//! then walks its ancestry with one of two strategies:
//!
//! - **Metadata table walk**: when a `.vmsd` file sits next to the descriptor,
//!   follow `parent` links from `snapshot.current` through its records.
//! - **Disk header walk**: otherwise, open each disk image and follow its
//!   embedded `parentFileNameHint` until a disk declares no parent.
//!
//! Files are opened one at a time and closed before the next is opened.
//! Both walks stop with [`ChainError::CycleDetected`] on revisiting a node,
//! independently of the configured depth ceiling.

use super::assembler::ChainOutputAssembler;
use super::bounded_disk_name;
use super::disk_selector::select_active_disk;
use super::error::{ChainError, ChainResult};
use super::extract::{QUOTE, extract_value};
use super::line_source::{FileSource, LineSource, LocalFiles};
use super::snapshot_table::SnapshotTableBuilder;
use crate::metrics::Metrics;
use crate::models::{DiskChain, FallbackMode, Limits, ResolverConfig, SnapshotTable, Strategy};
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashSet;
use std::io::{self, Read};

/// Extension of the snapshot metadata file kept beside the descriptor.
pub const METADATA_EXTENSION: &str = "vmsd";

/// Parent reference inside a disk image descriptor.
pub const PARENT_HINT_MARKER: &str = "parentFileNameHint=\"";

/// Derive the snapshot metadata path: `vm/machine.vmx` → `vm/machine.vmsd`.
///
/// # Errors
///
/// [`ChainError::BadArgument`] if the path has no extension to replace.
pub fn metadata_path(descriptor: &Utf8Path) -> ChainResult<Utf8PathBuf> {
    if descriptor.extension().is_none() {
        return Err(ChainError::BadArgument(format!(
            "invalid vmx path: {}",
            descriptor
        )));
    }
    Ok(descriptor.with_extension(METADATA_EXTENSION))
}

/// Follow `parent` links from `table.current_uid` until a root record.
///
/// The returned chain starts with `active_disk` followed by each visited
/// record's disk, newest to oldest. A metadata file with neither records nor
/// a current uid carries no history, and yields `active_disk` alone.
///
/// # Errors
///
/// - [`ChainError::ChainBroken`] if a uid on the path has no record
/// - [`ChainError::CycleDetected`] if a uid is reached twice
pub fn walk_snapshot_table(table: &SnapshotTable, active_disk: &str) -> ChainResult<DiskChain> {
    let mut chain = DiskChain::new(active_disk);
    if table.is_empty() && table.current_uid.is_empty() {
        tracing::warn!("Snapshot metadata has no snapshots, using active disk only");
        return Ok(chain);
    }

    let mut visited = HashSet::new();
    let mut cursor = table.current_uid.as_str();
    loop {
        if !visited.insert(cursor) {
            return Err(ChainError::CycleDetected(cursor.to_string()));
        }
        let record = table
            .find(cursor)
            .ok_or_else(|| ChainError::ChainBroken(cursor.to_string()))?;

        tracing::debug!(
            "Cur node uid: {}, name: {}, disk: {}",
            cursor,
            record.display_name,
            record.disk_name
        );
        chain.push_ancestor(record.disk_name.clone());

        if record.is_root() {
            return Ok(chain);
        }
        cursor = &record.parent_uid;
    }
}

/// The two ancestry walks behind one interface.
#[derive(Debug, Clone, Copy)]
pub enum ChainWalk<'a> {
    MetadataTable(&'a SnapshotTable),
    DiskHeader { base_dir: &'a Utf8Path },
}

impl ChainWalk<'_> {
    pub fn strategy(&self) -> Strategy {
        match self {
            ChainWalk::MetadataTable(_) => Strategy::MetadataTableWalk,
            ChainWalk::DiskHeader { .. } => Strategy::DiskHeaderWalk,
        }
    }
}

/// Outcome of a successful [`ChainResolver::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub descriptor: Utf8PathBuf,
    pub active_disk: String,
    pub strategy: Strategy,
    pub chain: DiskChain,
    /// Present when the chain came from snapshot metadata.
    pub table: Option<SnapshotTable>,
}

/// Resolves the disk chain of a virtual machine.
///
/// Generic over [`FileSource`] so the resolver can run against the local
/// filesystem or any other storage.
pub struct ChainResolver<F = LocalFiles> {
    config: ResolverConfig,
    source: F,
    metrics: Metrics,
}

impl ChainResolver<LocalFiles> {
    pub fn new(config: ResolverConfig) -> Self {
        Self::with_source(config, LocalFiles)
    }
}

impl<F: FileSource> ChainResolver<F> {
    pub fn with_source(config: ResolverConfig, source: F) -> Self {
        Self {
            config,
            source,
            metrics: Metrics::new(),
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Totals over every [`resolve`](Self::resolve) call on this resolver.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Resolve the disk chain for the machine descriptor at `descriptor`.
    ///
    /// # Errors
    ///
    /// Any [`ChainError`]; the first failure aborts the whole resolution.
    pub fn resolve(&self, descriptor: &Utf8Path) -> ChainResult<Resolution> {
        let metadata = metadata_path(descriptor)?;
        tracing::debug!("Got vmxpath: {}, vmsdpath: {}", descriptor, metadata);

        let active_disk = {
            let reader = self.open(descriptor, "machine descriptor")?;
            select_active_disk(
                descriptor,
                self.counted(LineSource::new(reader)),
                &self.config.selection,
                self.config.limits.max_disk_name_len,
            )?
        };

        let base_dir = descriptor.parent().unwrap_or(Utf8Path::new(""));

        let table = match self.source.open(&metadata) {
            Ok(reader) => {
                self.metrics.record_file_opened();
                Some(self.build_table(reader)?)
            }
            Err(e) => {
                tracing::debug!("No snapshot metadata at {}: {}", metadata, e);
                None
            }
        };

        let (strategy, chain) = match (&table, self.config.resolution.fallback) {
            (Some(table), _) => {
                let walk = ChainWalk::MetadataTable(table);
                (walk.strategy(), self.walk(walk, &active_disk)?)
            }
            (None, FallbackMode::DiskHeaderWalk) => {
                let walk = ChainWalk::DiskHeader { base_dir };
                (walk.strategy(), self.walk(walk, &active_disk)?)
            }
            (None, FallbackMode::ActiveDiskOnly) => {
                (Strategy::ActiveDiskOnly, DiskChain::new(active_disk.as_str()))
            }
        };

        tracing::info!("Resolved {} disk(s) by {}", chain.len(), strategy);
        self.metrics.log_summary();

        Ok(Resolution {
            descriptor: descriptor.to_path_buf(),
            active_disk,
            strategy,
            chain,
            table,
        })
    }

    /// Render a resolution with the configured capacity and order.
    pub fn render(&self, resolution: &Resolution) -> ChainResult<String> {
        ChainOutputAssembler::new(
            self.config.limits.output_capacity,
            self.config.resolution.order,
        )
        .render(&resolution.chain)
    }

    /// Run one of the ancestry walks from `active_disk`.
    pub fn walk(&self, walk: ChainWalk<'_>, active_disk: &str) -> ChainResult<DiskChain> {
        let chain = match walk {
            ChainWalk::MetadataTable(table) => walk_snapshot_table(table, active_disk)?,
            ChainWalk::DiskHeader { base_dir } => self.walk_disk_headers(base_dir, active_disk)?,
        };
        for _ in 1..chain.len() {
            self.metrics.record_hop();
        }
        Ok(chain)
    }

    fn build_table(&self, reader: Box<dyn Read>) -> ChainResult<SnapshotTable> {
        let builder = SnapshotTableBuilder::new(
            self.config.snapshots.grouping,
            self.config.limits.max_snapshots,
            self.config.limits.max_disk_name_len,
        );
        let table = builder.build(self.counted(LineSource::new(reader)))?;
        self.metrics.record_snapshot_records(table.len());
        Ok(table)
    }

    /// Follow `parentFileNameHint` from disk to disk, at most
    /// `max_chain_depth` images.
    fn walk_disk_headers(&self, base_dir: &Utf8Path, active_disk: &str) -> ChainResult<DiskChain> {
        let limits = &self.config.limits;
        let mut chain = DiskChain::new(active_disk);
        let mut visited = HashSet::from([active_disk.to_string()]);
        let mut current = active_disk.to_string();

        for _ in 0..limits.max_chain_depth {
            let path = base_dir.join(&current);
            let Some(parent) = self.read_parent_hint(&path, limits)? else {
                tracing::debug!("{} has no parent", path);
                return Ok(chain);
            };

            tracing::debug!("{} -> parent {}", current, parent);
            if !visited.insert(parent.clone()) {
                return Err(ChainError::CycleDetected(parent));
            }
            chain.push_ancestor(parent.as_str());
            current = parent;
        }

        Err(ChainError::ResourceExceeded {
            what: "disks in chain",
            limit: limits.max_chain_depth,
        })
    }

    /// Parent named in a disk image's descriptor, or `None` for a base image.
    fn read_parent_hint(&self, path: &Utf8Path, limits: &Limits) -> ChainResult<Option<String>> {
        let mut reader = self.open(path, "disk image")?;
        io::copy(
            &mut reader.by_ref().take(limits.descriptor_offset),
            &mut io::sink(),
        )?;

        for line in self.counted(LineSource::bounded(reader, limits.max_descriptor_bytes)) {
            let line = line?;
            if !line.contains(PARENT_HINT_MARKER) {
                continue;
            }
            let hint = extract_value(&line, PARENT_HINT_MARKER, QUOTE).ok_or_else(|| {
                ChainError::MalformedInput(format!("unterminated parent hint in {}", path))
            })?;
            if hint.is_empty() {
                return Ok(None);
            }
            return bounded_disk_name(hint, limits.max_disk_name_len).map(Some);
        }
        Ok(None)
    }

    fn open(&self, path: &Utf8Path, what: &'static str) -> ChainResult<Box<dyn Read>> {
        let reader = self
            .source
            .open(path)
            .map_err(|source| ChainError::NotFound {
                what,
                path: path.to_path_buf(),
                source,
            })?;
        self.metrics.record_file_opened();
        tracing::debug!("Opened {}: {}", what, path);
        Ok(reader)
    }

    /// Count lines as they are consumed.
    fn counted<'a, R: Read + 'a>(
        &'a self,
        lines: LineSource<R>,
    ) -> impl Iterator<Item = io::Result<String>> + 'a {
        lines.inspect(|_| self.metrics.record_line())
    }
}
