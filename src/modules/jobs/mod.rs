/// Batch job system
///
/// Drives many jobs through a caller-supplied processor across a pool of
/// credentials with bounded concurrency:
/// - Domain: job trait, queue, progress counters and stop signal
/// - Worker: the rate-limit-aware batch orchestrator
pub mod domain;
pub mod worker;

// Re-exports for easy access
pub use domain::{
    BatchJob, BatchOutcome, JobProcessor, JobQueue, ProgressState, ProgressTracker, StopSignal,
};
pub use worker::{BatchOrchestrator, OrchestratorSettings};
