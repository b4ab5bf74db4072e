/// Rate-limit-aware batch orchestrator
///
/// Runs `pool size × concurrency` logical workers, each bound to one
/// credential for its whole life. Workers are futures joined inside the
/// caller's task, so queue and counter updates never interleave mid-step.
use crate::modules::credentials::{
    Credential, CredentialPool, RateLimitTracker, DEFAULT_RATE_LIMIT_COOLDOWN,
};
use crate::modules::jobs::domain::{
    BatchJob, BatchOutcome, JobProcessor, JobQueue, ProgressTracker, StopSignal,
};
use crate::modules::studio::domain::ActivityLog;
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::{LogContext, TimedOperation};
use crate::{log_debug, log_info, log_warn};
use futures::future::join_all;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorSettings {
    /// How long a credential is parked after a rate-limit rejection
    pub cooldown: Duration,
    /// Upper bound of one idle sleep while the bound credential is parked
    pub idle_poll: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            cooldown: DEFAULT_RATE_LIMIT_COOLDOWN,
            idle_poll: Duration::from_secs(1),
        }
    }
}

#[derive(Clone)]
pub struct BatchOrchestrator {
    pool: CredentialPool,
    rate_limits: RateLimitTracker,
    progress: ProgressTracker,
    stop: StopSignal,
    activity: ActivityLog,
    settings: OrchestratorSettings,
}

impl BatchOrchestrator {
    pub fn new(
        pool: CredentialPool,
        rate_limits: RateLimitTracker,
        progress: ProgressTracker,
        stop: StopSignal,
        activity: ActivityLog,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            pool,
            rate_limits,
            progress,
            stop,
            activity,
            settings,
        }
    }

    pub fn with_settings(mut self, settings: OrchestratorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    pub fn stop_signal(&self) -> &StopSignal {
        &self.stop
    }

    pub fn rate_limits(&self) -> &RateLimitTracker {
        &self.rate_limits
    }

    /// Process every item and resolve once all workers have exited
    ///
    /// Individual job failures are accounted by the processor and never fail
    /// the run. The only error is an empty credential pool, reported before
    /// any work starts.
    pub async fn run_batch<J, P>(
        &self,
        items: Vec<J>,
        variants_per_item: usize,
        concurrency_per_credential: usize,
        processor: &P,
    ) -> AppResult<BatchOutcome>
    where
        J: BatchJob,
        P: JobProcessor<J> + ?Sized,
    {
        self.stop.reset();
        self.activity.dismiss_banner().await;
        self.progress.reset(items.len() * variants_per_item);

        let credentials = self.pool.snapshot();
        if credentials.is_empty() {
            let message = "No API key configured. Add one in the API settings.";
            self.activity.error(message).await;
            return Err(AppError::ValidationError(message.to_string()));
        }

        let concurrency = concurrency_per_credential.max(1);
        let timer = TimedOperation::new("batch run");
        log_info!(
            "Starting batch: {} items x {} variants on {} credentials ({} workers)",
            items.len(),
            variants_per_item,
            credentials.len(),
            credentials.len() * concurrency
        );

        let queue = JobQueue::new(items);
        let retries = AtomicUsize::new(0);

        let workers = credentials
            .iter()
            .flat_map(|credential| std::iter::repeat(credential).take(concurrency))
            .enumerate()
            .map(|(worker_id, credential)| {
                self.worker_loop(worker_id, credential, &queue, processor, &retries)
            });
        join_all(workers).await;

        let outcome = BatchOutcome {
            stopped: self.stop.is_stopped(),
            progress: self.progress.snapshot(),
            rate_limit_retries: retries.load(Ordering::SeqCst),
        };

        LogContext::batch_progress(
            outcome.progress.completed,
            outcome.progress.total,
            outcome.progress.errors,
        );
        if outcome.stopped {
            self.activity.info("Processing stopped by user.").await;
        } else {
            self.activity
                .info(format!(
                    "Batch finished: {} succeeded, {} failed.",
                    outcome.progress.succeeded(),
                    outcome.progress.errors
                ))
                .await;
        }
        timer.finish_with_info(&format!("{} rate-limit retries", outcome.rate_limit_retries));

        Ok(outcome)
    }

    async fn worker_loop<J, P>(
        &self,
        worker_id: usize,
        credential: &Credential,
        queue: &JobQueue<J>,
        processor: &P,
        retries: &AtomicUsize,
    ) where
        J: BatchJob,
        P: JobProcessor<J> + ?Sized,
    {
        log_debug!("Worker {} started on credential {}", worker_id, credential);

        loop {
            if self.stop.is_stopped() {
                break;
            }

            let now = Instant::now();
            if let Some(until) = self.rate_limits.blocked_until(credential, now) {
                if queue.is_empty().await {
                    break;
                }
                let wait = (until - now).min(self.settings.idle_poll);
                tokio::time::sleep(wait).await;
                continue;
            }

            let job = match queue.pop_front().await {
                Some(job) => job,
                None => break,
            };

            match processor.process(&job, credential).await {
                Ok(()) => {}
                Err(e) if e.is_rate_limit() => {
                    self.rate_limits
                        .block(credential, Instant::now(), self.settings.cooldown);
                    retries.fetch_add(1, Ordering::SeqCst);
                    log_warn!(
                        "Worker {}: job {} hit a rate limit, re-queued: {}",
                        worker_id,
                        job.id(),
                        e
                    );
                    self.activity
                        .info(format!(
                            "API key {} is rate limited, pausing it for {}s.",
                            credential,
                            self.settings.cooldown.as_secs()
                        ))
                        .await;
                    queue.push_front(job).await;
                }
                Err(e) => {
                    log_warn!("Worker {}: job {} failed: {}", worker_id, job.id(), e);
                }
            }
        }

        log_debug!("Worker {} finished", worker_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Item(String);

    impl BatchJob for Item {
        fn id(&self) -> &str {
            &self.0
        }
    }

    struct CountingProcessor {
        progress: ProgressTracker,
    }

    #[async_trait]
    impl JobProcessor<Item> for CountingProcessor {
        async fn process(&self, _job: &Item, _credential: &Credential) -> AppResult<()> {
            self.progress.record_success();
            Ok(())
        }
    }

    fn orchestrator(keys: &[&str]) -> BatchOrchestrator {
        BatchOrchestrator::new(
            CredentialPool::from_keys(keys.iter().copied()),
            RateLimitTracker::new(),
            ProgressTracker::new(),
            StopSignal::new(),
            ActivityLog::new(),
            OrchestratorSettings::default(),
        )
    }

    #[tokio::test]
    async fn test_empty_pool_fails_fast() {
        let orchestrator = orchestrator(&[]);
        let processor = CountingProcessor {
            progress: orchestrator.progress().clone(),
        };

        let result = orchestrator
            .run_batch(vec![Item("a".into())], 1, 1, &processor)
            .await;

        assert!(matches!(result, Err(AppError::ValidationError(_))));
        assert_eq!(orchestrator.progress().snapshot().completed, 0);
        assert!(orchestrator.activity.banner().await.is_some());
    }

    #[tokio::test]
    async fn test_drains_queue() {
        let orchestrator = orchestrator(&["k1", "k2"]);
        let processor = CountingProcessor {
            progress: orchestrator.progress().clone(),
        };
        let items = (0..5).map(|i| Item(i.to_string())).collect();

        let outcome = orchestrator.run_batch(items, 1, 2, &processor).await.unwrap();

        assert!(!outcome.stopped);
        assert_eq!(outcome.progress.total, 5);
        assert_eq!(outcome.progress.completed, 5);
        assert_eq!(outcome.rate_limit_retries, 0);
    }

    #[tokio::test]
    async fn test_stop_before_start_is_cleared() {
        let orchestrator = orchestrator(&["k1"]);
        orchestrator.stop_signal().stop();
        let processor = CountingProcessor {
            progress: orchestrator.progress().clone(),
        };

        let outcome = orchestrator
            .run_batch(vec![Item("a".into())], 1, 1, &processor)
            .await
            .unwrap();

        assert!(!outcome.stopped);
        assert_eq!(outcome.progress.completed, 1);
    }
}
