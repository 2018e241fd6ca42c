//! Thread-safe per-file and batch-level progress aggregation (spec §4.7).
//!
//! [`BatchProgressObserver`] wraps an inner [`ProgressObserver`] and
//! maintains the atomic batch counters; every per-file event delegates to
//! the inner observer unchanged.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::info;

/// Per-file and batch-level callbacks the pipeline publishes to as it
/// runs (spec §4.4's "publishes events to a ProgressObserver").
pub trait ProgressObserver: Send + Sync {
    fn on_processing_started(&self, _file: &Path, _total_stages: u32) {}
    fn on_stage_started(&self, _file: &Path, _stage_name: &str) {}
    fn on_stage_completed(&self, _file: &Path, _stage_name: &str) {}
    fn on_processing_completed(&self, _file: &Path) {}
    fn on_processing_failed(&self, _file: &Path, _message: &str) {}
    fn on_pipeline_closed(&self) {}
}

/// An observer that discards every event; the default when the caller
/// doesn't want per-file visibility.
pub struct NullObserver;

impl ProgressObserver for NullObserver {}

/// An observer that emits a `tracing` event per callback, the ambient
/// logging stack applied to progress specifically.
pub struct LoggingObserver;

impl ProgressObserver for LoggingObserver {
    fn on_processing_started(&self, file: &Path, total_stages: u32) {
        info!(file = %file.display(), total_stages, "processing started");
    }

    fn on_stage_started(&self, file: &Path, stage_name: &str) {
        info!(file = %file.display(), stage = stage_name, "stage started");
    }

    fn on_stage_completed(&self, file: &Path, stage_name: &str) {
        info!(file = %file.display(), stage = stage_name, "stage completed");
    }

    fn on_processing_completed(&self, file: &Path) {
        info!(file = %file.display(), "processing completed");
    }

    fn on_processing_failed(&self, file: &Path, message: &str) {
        info!(file = %file.display(), message, "processing failed");
    }

    fn on_pipeline_closed(&self) {
        info!("pipeline closed");
    }
}

/// Batch-level counters maintained with atomic-increment semantics (spec
/// §3's `BatchStats`, testable property §8.9).
#[derive(Debug)]
pub struct BatchStats {
    pub total_files: u64,
    completed: AtomicU64,
    errors: AtomicU64,
    start_time: Instant,
    last_report_millis: AtomicU64,
}

impl BatchStats {
    pub fn new(total_files: u64) -> Self {
        Self {
            total_files,
            completed: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            start_time: Instant::now(),
            last_report_millis: AtomicU64::new(0),
        }
    }

    pub fn completed_count(&self) -> u64 {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn error_count(&self) -> u64 {
        self.errors.load(Ordering::SeqCst)
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// Wraps an inner [`ProgressObserver`], aggregating batch-level counters
/// and emitting a bucketed or time-gated report.
///
/// Every per-file event delegates to the inner observer unchanged;
/// `completed_count` increments on both success and failure. A report is
/// emitted on every bucket of `max(1, total_files / 10)` completions, or
/// if >= 5 seconds have elapsed since the last report — whichever comes
/// first — guarded by a CAS on `last_report_time` so only one thread ever
/// emits a given report (spec §4.7).
pub struct BatchProgressObserver<O: ProgressObserver> {
    inner: O,
    stats: BatchStats,
    bucket_size: u64,
    report_interval: Duration,
    reporter: Box<dyn Fn(&BatchStats) + Send + Sync>,
}

const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(5);

impl<O: ProgressObserver> BatchProgressObserver<O> {
    pub fn new(inner: O, total_files: u64, reporter: impl Fn(&BatchStats) + Send + Sync + 'static) -> Self {
        Self {
            inner,
            stats: BatchStats::new(total_files),
            bucket_size: (total_files / 10).max(1),
            report_interval: DEFAULT_REPORT_INTERVAL,
            reporter: Box::new(reporter),
        }
    }

    pub fn stats(&self) -> &BatchStats {
        &self.stats
    }

    fn record_completion(&self, failed: bool) {
        let completed = self.stats.completed.fetch_add(1, Ordering::SeqCst) + 1;
        if failed {
            self.stats.errors.fetch_add(1, Ordering::SeqCst);
        }

        let bucket_boundary = completed % self.bucket_size == 0 || completed == self.stats.total_files;
        let now_millis = self.stats.start_time.elapsed().as_millis() as u64;
        let last = self.stats.last_report_millis.load(Ordering::SeqCst);
        let time_elapsed = now_millis.saturating_sub(last) >= self.report_interval.as_millis() as u64;

        if bucket_boundary || time_elapsed {
            if self
                .stats
                .last_report_millis
                .compare_exchange(last, now_millis, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                (self.reporter)(&self.stats);
            }
        }
    }
}

impl<O: ProgressObserver> ProgressObserver for BatchProgressObserver<O> {
    fn on_processing_started(&self, file: &Path, total_stages: u32) {
        self.inner.on_processing_started(file, total_stages);
    }

    fn on_stage_started(&self, file: &Path, stage_name: &str) {
        self.inner.on_stage_started(file, stage_name);
    }

    fn on_stage_completed(&self, file: &Path, stage_name: &str) {
        self.inner.on_stage_completed(file, stage_name);
    }

    fn on_processing_completed(&self, file: &Path) {
        self.inner.on_processing_completed(file);
        self.record_completion(false);
    }

    fn on_processing_failed(&self, file: &Path, message: &str) {
        self.inner.on_processing_failed(file, message);
        self.record_completion(true);
    }

    fn on_pipeline_closed(&self) {
        self.inner.on_pipeline_closed();
        (self.reporter)(&self.stats);
    }
}
