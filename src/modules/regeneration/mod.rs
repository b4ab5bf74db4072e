/// Regeneration of individual results
///
/// A "regenerate" request moves an image from the gallery into the queue;
/// one background worker processes the queue strictly one item at a time.
pub mod domain;
pub mod queue;
pub mod worker;

pub use domain::{RegenerationPolicy, RegenerationQueueItem};
pub use queue::RegenerationQueue;
pub use worker::RegenerationWorker;
