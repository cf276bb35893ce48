// Resolution metrics module
//
// Lightweight counters describing how much work a resolver has done

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Running totals for one resolver, across every resolution it performs.
///
/// Counters are never reset; `elapsed` measures from the resolver's
/// construction. Atomics keep the recording methods `&self` so the resolver
/// can be shared by reference while it counts.
#[derive(Debug)]
pub struct Metrics {
    /// Files successfully opened (descriptor, metadata, disk images)
    pub files_opened: AtomicUsize,

    /// Text lines consumed from all files
    pub lines_scanned: AtomicU64,

    /// Snapshot records built from the metadata file
    pub snapshot_records: AtomicUsize,

    /// Parent links followed, in either strategy
    pub chain_hops: AtomicUsize,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            files_opened: AtomicUsize::new(0),
            lines_scanned: AtomicU64::new(0),
            snapshot_records: AtomicUsize::new(0),
            chain_hops: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_file_opened(&self) {
        self.files_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_line(&self) {
        self.lines_scanned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_snapshot_records(&self, count: usize) {
        self.snapshot_records.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_hop(&self) {
        self.chain_hops.fetch_add(1, Ordering::Relaxed);
    }

    /// Time since the counters were created
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Log the running totals
    pub fn log_summary(&self) {
        tracing::debug!(
            "Resolver totals: {} files opened, {} lines scanned, {} records, {} hops in {:.2}ms",
            self.files_opened.load(Ordering::Relaxed),
            self.lines_scanned.load(Ordering::Relaxed),
            self.snapshot_records.load(Ordering::Relaxed),
            self.chain_hops.load(Ordering::Relaxed),
            self.elapsed().as_secs_f64() * 1000.0
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
