//! Bounded-concurrency batch execution: a fixed worker pool drains a
//! back-pressured queue of files through a [`FilePipeline`], enforcing a
//! batch-wide deadline and fail-fast halting (spec §4.6, §5).
//!
//! Grounded in the same shape as a bounded mpsc sized for back-pressure
//! plus atomic telemetry counters, adapted here to `crossbeam-channel`
//! since this crate has no async runtime to hand a `tokio::mpsc` to.

use crate::deadline::Deadline;
use crate::pipeline::{FileOutcome, FilePipeline};
use crate::progress::ProgressObserver;
use crate::recovery::{error_threshold_exceeded, CancellationToken, StageResult, DEFAULT_MAX_ERROR_THRESHOLD};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{info, warn};

/// Tunables for one batch run (spec §4.6, §5).
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Number of worker threads draining the queue. Defaults to the
    /// detected core count.
    pub worker_count: usize,
    /// Wall-clock limit for the whole batch, independent of any per-file
    /// deadline passed to [`FilePipeline::run`].
    pub deadline: Deadline,
    /// Batch-wide failure count past which dispatch halts even without a
    /// `FailFast`-configured stage (spec §7).
    pub max_errors: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            worker_count: thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
            deadline: Deadline::none(),
            max_errors: DEFAULT_MAX_ERROR_THRESHOLD,
        }
    }
}

/// The outcome of one batch run: every file's result (in completion
/// order, not dispatch order) plus whether dispatch halted early.
pub struct BatchReport {
    pub results: Vec<StageResult<FileOutcome>>,
    pub halted_early: bool,
}

impl BatchReport {
    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.results.len() - self.success_count()
    }
}

/// Cancellation flag shared between the dispatcher and every worker: set
/// once by a `FailFast` stage result, a batch-wide error-threshold trip,
/// or the batch deadline expiring. Workers check it between files; a
/// worker mid-retry-sleep is cancelled by the same flag via the
/// [`CancellationToken`] impl below (spec §5: "interrupting a sleeping
/// retry returns failure immediately").
struct Halt(AtomicBool);

impl Halt {
    fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    fn trip(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    fn is_tripped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl CancellationToken for Halt {
    fn is_cancelled(&self) -> bool {
        self.is_tripped()
    }
}

/// Runs `files` through `pipeline` using a bounded pool of
/// `config.worker_count` threads (spec §4.6).
///
/// The work queue is bounded to `2 * worker_count` in flight, so a slow
/// consumer naturally back-pressures the dispatcher rather than
/// buffering the whole batch in memory up front. Dispatch stops handing
/// out new files as soon as the shared halt flag trips (deadline
/// exceeded, a `FailFast` stage result, or the batch error threshold);
/// files already in flight are allowed to finish rather than aborted
/// mid-stage.
pub fn run_batch(
    pipeline: &FilePipeline<'_>,
    files: &[PathBuf],
    observer: &(dyn ProgressObserver + Sync),
    config: &ExecutorConfig,
) -> BatchReport {
    let worker_count = config.worker_count.max(1);
    let queue_capacity = (worker_count * 2).max(1);

    let (work_tx, work_rx): (Sender<PathBuf>, Receiver<PathBuf>) = bounded(queue_capacity);
    let (result_tx, result_rx): (Sender<StageResult<FileOutcome>>, Receiver<StageResult<FileOutcome>>) =
        bounded(queue_capacity);

    let halt = Arc::new(Halt::new());

    info!(worker_count, total_files = files.len(), "starting batch");

    thread::scope(|scope| {
        for worker_id in 0..worker_count {
            let work_rx = work_rx.clone();
            let result_tx = result_tx.clone();
            let halt = Arc::clone(&halt);
            scope.spawn(move || {
                while let Ok(path) = work_rx.recv() {
                    if halt.is_tripped() {
                        break;
                    }
                    let (result, halt_signal) = pipeline.run(&path, observer, config.deadline);
                    let failed = !result.is_success();
                    if halt_signal.is_some() {
                        warn!(worker_id, file = %path.display(), "fail-fast stage result, halting dispatch");
                        halt.trip();
                    }
                    if result_tx.send(result).is_err() {
                        break;
                    }
                    if failed {
                        warn!(worker_id, file = %path.display(), "file processing failed");
                    }
                }
            });
        }
        drop(result_tx);

        let dispatcher_halt = Arc::clone(&halt);
        scope.spawn(move || {
            for path in files {
                if dispatcher_halt.is_tripped() || config.deadline.is_expired() {
                    dispatcher_halt.trip();
                    break;
                }
                if work_tx.send(path.clone()).is_err() {
                    break;
                }
            }
        });

        let mut results = Vec::with_capacity(files.len());
        let mut error_count = 0usize;
        while let Ok(result) = result_rx.recv() {
            if !result.is_success() {
                error_count += 1;
                if error_threshold_exceeded(error_count, config.max_errors) {
                    halt.trip();
                }
            }
            results.push(result);
        }

        observer.on_pipeline_closed();
        info!(completed = results.len(), halted = halt.is_tripped(), "batch finished");

        BatchReport {
            halted_early: halt.is_tripped() && results.len() < files.len(),
            results,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_configurations;
    use crate::error::{PipelineError, ResourceLimit};
    use crate::pipeline::{RecoveryPolicy, SimpleCBraceParser, SourceReader};
    use crate::progress::NullObserver;
    use crate::recovery::RecoveryStrategy;
    use crate::rules::RuleRegistry;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    struct FixedReader;
    impl SourceReader for FixedReader {
        fn read(&self, _path: &Path) -> Result<String, PipelineError> {
            Ok("short line\n".to_string())
        }
    }

    #[test]
    fn batch_processes_every_file() {
        let reader = FixedReader;
        let parser = SimpleCBraceParser;
        let registry = RuleRegistry::with_builtins();
        let configs = default_configurations();
        let pipeline = FilePipeline::new(&reader, &parser, &registry, &configs);

        let files: Vec<PathBuf> = (0..8).map(|i| PathBuf::from(format!("f{i}.java"))).collect();
        let config = ExecutorConfig {
            worker_count: 3,
            ..ExecutorConfig::default()
        };
        let report = run_batch(&pipeline, &files, &NullObserver, &config);
        assert_eq!(report.results.len(), 8);
        assert_eq!(report.success_count(), 8);
        assert!(!report.halted_early);
    }

    #[test]
    fn batch_halts_after_error_threshold() {
        struct FailingReader;
        impl SourceReader for FailingReader {
            fn read(&self, path: &Path) -> Result<String, PipelineError> {
                Err(PipelineError::ResourceLimit {
                    file_path: path.to_path_buf(),
                    limit: ResourceLimit::FileSizeBytes(1),
                })
            }
        }
        let reader = FailingReader;
        let parser = SimpleCBraceParser;
        let registry = RuleRegistry::with_builtins();
        let configs = default_configurations();
        let pipeline = FilePipeline::new(&reader, &parser, &registry, &configs);

        let files: Vec<PathBuf> = (0..20).map(|i| PathBuf::from(format!("f{i}.java"))).collect();
        let config = ExecutorConfig {
            worker_count: 2,
            max_errors: 3,
            ..ExecutorConfig::default()
        };
        let report = run_batch(&pipeline, &files, &NullObserver, &config);
        assert!(report.failure_count() >= 3);
        assert!(report.results.len() <= files.len());
    }

    #[test]
    fn batch_halts_immediately_on_fail_fast_stage_result() {
        struct FailingReader(AtomicUsize);
        impl SourceReader for FailingReader {
            fn read(&self, path: &Path) -> Result<String, PipelineError> {
                self.0.fetch_add(1, AtomicOrdering::SeqCst);
                Err(PipelineError::ResourceLimit {
                    file_path: path.to_path_buf(),
                    limit: ResourceLimit::FileSizeBytes(1),
                })
            }
        }
        let reader = FailingReader(AtomicUsize::new(0));
        let parser = SimpleCBraceParser;
        let registry = RuleRegistry::with_builtins();
        let configs = default_configurations();
        let pipeline = FilePipeline::new(&reader, &parser, &registry, &configs).with_recovery(RecoveryPolicy {
            read: RecoveryStrategy::FailFast,
            ..RecoveryPolicy::default()
        });

        let files: Vec<PathBuf> = (0..50).map(|i| PathBuf::from(format!("f{i}.java"))).collect();
        let config = ExecutorConfig {
            worker_count: 1,
            ..ExecutorConfig::default()
        };
        let report = run_batch(&pipeline, &files, &NullObserver, &config);
        assert!(report.halted_early);
        assert!(report.results.len() < files.len());
    }

    #[test]
    fn default_config_picks_a_positive_worker_count() {
        assert!(ExecutorConfig::default().worker_count >= 1);
    }
}
