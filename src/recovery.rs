//! Error recovery strategies a pipeline stage can be configured with
//! (spec §4.5, §9 "Recovery composition").

use crate::error::{PipelineError, StagePipelineError};
use std::thread;
use std::time::Duration;
use tracing::{error, warn};

/// The outcome of running a stage, whether directly or through recovery.
#[derive(Debug, Clone)]
pub enum StageResult<T> {
    Success(T),
    Failure(StagePipelineError),
}

impl<T> StageResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, StageResult::Success(_))
    }
}

/// Signals the batch executor should stop dispatching new files, raised
/// by [`RecoveryStrategy::FailFast`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HaltSignal;

/// Cooperative cancellation check for a sleeping retry loop (spec §5:
/// "interrupting a sleeping retry returns failure immediately").
pub trait CancellationToken: Send + Sync {
    fn is_cancelled(&self) -> bool;
}

/// A token that is never cancelled, for call sites with no cancellation
/// source (tests, one-off CLI runs).
pub struct NeverCancelled;

impl CancellationToken for NeverCancelled {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// One of the four recovery strategies a stage may be configured with
/// (spec §4.5).
#[derive(Debug, Clone)]
pub enum RecoveryStrategy<T> {
    /// Logs at error level and returns `Failure`; the pipeline stops for
    /// this file but the batch continues.
    SkipFile,
    /// Re-invokes the failing operation up to `max_attempts` times with
    /// exponential backoff (testable property §8.8).
    Retry { max_attempts: u32, initial_delay_ms: u64 },
    /// Returns `Success(value)` unconditionally — used by the format
    /// stage, falling back to the original source text.
    Fallback(T),
    /// Returns `Failure` and additionally signals the executor to halt
    /// dispatching new files.
    FailFast,
}

impl<T: Clone> RecoveryStrategy<T> {
    /// Applies this strategy after `error` has already been observed once
    /// by calling the stage. `retry_op` re-runs the original operation;
    /// it is only invoked by [`RecoveryStrategy::Retry`].
    ///
    /// Returns the recovered [`StageResult`] and, for `FailFast`, a
    /// [`HaltSignal`] the caller should propagate to its executor.
    pub fn recover(
        &self,
        error: StagePipelineError,
        mut retry_op: impl FnMut() -> Result<T, StagePipelineError>,
        cancellation: &dyn CancellationToken,
    ) -> (StageResult<T>, Option<HaltSignal>) {
        match self {
            RecoveryStrategy::SkipFile => {
                error!(stage = error.stage_name, %error, "skipping file after stage failure");
                (StageResult::Failure(error), None)
            }
            RecoveryStrategy::Retry {
                max_attempts,
                initial_delay_ms,
            } => (retry(*max_attempts, *initial_delay_ms, error, &mut retry_op, cancellation), None),
            RecoveryStrategy::Fallback(value) => (StageResult::Success(value.clone()), None),
            RecoveryStrategy::FailFast => {
                error!(stage = error.stage_name, %error, "fail-fast: halting batch dispatch");
                (StageResult::Failure(error), Some(HaltSignal))
            }
        }
    }
}

/// `Retry(n, d)`'s backoff: invokes `retry_op` up to `max_attempts` times
/// total (the first call already having failed and produced `last_error`).
/// Delay before attempt `k` (2-indexed) is `initial_delay_ms * 2^(k-2)` ms.
/// Cancellation during a sleep returns the original error immediately
/// (spec §4.5, §5).
fn retry<T>(
    max_attempts: u32,
    initial_delay_ms: u64,
    mut last_error: StagePipelineError,
    retry_op: &mut impl FnMut() -> Result<T, StagePipelineError>,
    cancellation: &dyn CancellationToken,
) -> StageResult<T> {
    assert!(max_attempts >= 1, "Retry requires max_attempts >= 1");
    assert!(initial_delay_ms >= 1, "Retry requires initial_delay_ms >= 1");

    // Attempt 1 already failed (that's why we're here). Attempts 2..=max.
    for attempt in 2..=max_attempts {
        let delay_ms = initial_delay_ms * 2u64.pow(attempt - 2);
        if cancellation.is_cancelled() {
            warn!(attempt, "retry cancelled before backoff sleep");
            return StageResult::Failure(last_error);
        }
        thread::sleep(Duration::from_millis(delay_ms));
        if cancellation.is_cancelled() {
            warn!(attempt, "retry cancelled after backoff sleep");
            return StageResult::Failure(last_error);
        }
        match retry_op() {
            Ok(value) => return StageResult::Success(value),
            Err(err) => {
                warn!(attempt, %err, "retry attempt failed");
                last_error = err.with_cause(last_error);
            }
        }
    }
    StageResult::Failure(last_error)
}

/// Left-folds two strategies: the outer strategy's `recover` call wraps
/// the inner one, so the outer sees the inner's final result (design note
/// §9, "Retry then Fallback").
pub struct CompositeStrategy<T> {
    pub inner: RecoveryStrategy<T>,
    pub outer: RecoveryStrategy<T>,
}

impl<T: Clone> CompositeStrategy<T> {
    pub fn recover(
        &self,
        error: StagePipelineError,
        mut retry_op: impl FnMut() -> Result<T, StagePipelineError>,
        cancellation: &dyn CancellationToken,
    ) -> (StageResult<T>, Option<HaltSignal>) {
        let (inner_result, inner_halt) = self.inner.recover(error, &mut retry_op, cancellation);
        match inner_result {
            StageResult::Success(value) => (StageResult::Success(value), inner_halt),
            StageResult::Failure(err) => {
                let (outer_result, outer_halt) = self.outer.recover(err, &mut retry_op, cancellation);
                (outer_result, inner_halt.or(outer_halt))
            }
        }
    }
}

pub fn error_threshold_exceeded(error_count: usize, max_errors: usize) -> bool {
    error_count >= max_errors
}

/// Default maximum batch-wide error count before halting (spec §7).
pub const DEFAULT_MAX_ERROR_THRESHOLD: usize = 100;
