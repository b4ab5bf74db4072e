/// Domain entities for the batch job system
///
/// A batch run owns one progress tracker and one stop signal; both are
/// shared with the processors that do the actual work.
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// A unit of batch work with a stable identity
pub trait BatchJob: Send + Sync {
    fn id(&self) -> &str;
}

/// Point-in-time view of the aggregate counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProgressState {
    pub total: usize,
    /// Processed units, successful or not
    pub completed: usize,
    /// Failed subset of `completed`
    pub errors: usize,
}

impl ProgressState {
    pub fn succeeded(&self) -> usize {
        self.completed.saturating_sub(self.errors)
    }

    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// Aggregate counters for one run. Reset at the start of every batch and
/// only incremented afterwards.
#[derive(Clone, Default)]
pub struct ProgressTracker {
    total: Arc<AtomicUsize>,
    completed: Arc<AtomicUsize>,
    errors: Arc<AtomicUsize>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&self, total: usize) {
        self.total.store(total, Ordering::SeqCst);
        self.completed.store(0, Ordering::SeqCst);
        self.errors.store(0, Ordering::SeqCst);
    }

    pub fn record_success(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    /// `units` failed, e.g. a variant and every variant after it
    pub fn record_failure(&self, units: usize) {
        self.completed.fetch_add(units, Ordering::SeqCst);
        self.errors.fetch_add(units, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> ProgressState {
        ProgressState {
            total: self.total.load(Ordering::SeqCst),
            completed: self.completed.load(Ordering::SeqCst),
            errors: self.errors.load(Ordering::SeqCst),
        }
    }
}

/// Cooperative cancellation flag, polled at iteration boundaries
#[derive(Clone, Default)]
pub struct StopSignal {
    stopped: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    /// Only the start of the next run clears the flag
    pub fn reset(&self) {
        self.stopped.store(false, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Result of a finished batch run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    /// The run ended because the stop signal was raised
    pub stopped: bool,
    pub progress: ProgressState,
    /// Jobs pushed back to the queue after a rate-limit rejection
    pub rate_limit_retries: usize,
}
