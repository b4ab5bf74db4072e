use std::collections::VecDeque;
use tokio::sync::Mutex;

/// FIFO work list consumed destructively by batch workers.
///
/// A popped job belongs to exactly one worker; on a retryable failure it
/// goes back to the front.
pub struct JobQueue<J> {
    jobs: Mutex<VecDeque<J>>,
}

impl<J> JobQueue<J> {
    pub fn new(jobs: Vec<J>) -> Self {
        Self {
            jobs: Mutex::new(jobs.into()),
        }
    }

    pub async fn pop_front(&self) -> Option<J> {
        self.jobs.lock().await.pop_front()
    }

    pub async fn push_front(&self, job: J) {
        self.jobs.lock().await.push_front(job);
    }

    pub async fn len(&self) -> usize {
        self.jobs.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.lock().await.is_empty()
    }
}
