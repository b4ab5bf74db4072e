use super::entities::BatchJob;
use crate::modules::credentials::Credential;
use crate::shared::errors::AppResult;
use async_trait::async_trait;

/// Work performed for one dequeued job
///
/// Implementations own their bookkeeping: progress increments, per-item
/// status and cached intermediate results keyed by job id. Returning
/// `AppError::RateLimitError` hands the job back to the orchestrator for a
/// retry on the same credential after its cool-down, so processing must be
/// safe to resume. Any other error is terminal for the job.
#[async_trait]
pub trait JobProcessor<J: BatchJob>: Send + Sync {
    async fn process(&self, job: &J, credential: &Credential) -> AppResult<()>;
}
