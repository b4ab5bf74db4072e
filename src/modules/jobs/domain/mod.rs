pub mod entities;
pub mod processor;
pub mod queue;

pub use entities::{BatchJob, BatchOutcome, ProgressState, ProgressTracker, StopSignal};
pub use processor::JobProcessor;
pub use queue::JobQueue;
