//! Transport-level retry policy for the generation API.
//!
//! Only transient server and network failures are retried here. Quota and
//! auth rejections are surfaced immediately so the batch orchestrator can
//! park the credential.

use reqwest::StatusCode;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    pub base_delay: Duration,
    /// Upper bound of a single wait
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl RetryPolicy {
    pub fn gemini() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(20),
            backoff_multiplier: 2.0,
        }
    }

    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::gemini()
        }
    }

    /// Calculate delay for next retry attempt
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let multiplier = self.backoff_multiplier.powi(attempt as i32);
        let delay = Duration::from_millis((self.base_delay.as_millis() as f64 * multiplier) as u64);
        delay.min(self.max_delay)
    }
}

/// Server errors that may succeed on a second attempt
pub fn is_retryable_status(status: StatusCode) -> bool {
    matches!(status.as_u16(), 500 | 502 | 503 | 504)
}

/// Network errors are potentially retryable
pub fn is_retryable_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect()
}
