//! Per-credential cool-down table.
//!
//! Entries are never deleted; an entry whose deadline has passed is simply
//! ignored on the next lookup.

use crate::modules::credentials::domain::Credential;
use crate::log_warn;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Observed quota window of the remote API
pub const DEFAULT_RATE_LIMIT_COOLDOWN: Duration = Duration::from_millis(61_000);

#[derive(Clone, Default)]
pub struct RateLimitTracker {
    blocked: Arc<DashMap<Credential, Instant>>,
}

impl RateLimitTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_blocked(&self, credential: &Credential, now: Instant) -> bool {
        self.blocked_until(credential, now).is_some()
    }

    /// Deadline of an active block, `None` when the credential is usable
    pub fn blocked_until(&self, credential: &Credential, now: Instant) -> Option<Instant> {
        self.blocked
            .get(credential)
            .map(|entry| *entry.value())
            .filter(|until| *until > now)
    }

    pub fn block(&self, credential: &Credential, now: Instant, duration: Duration) {
        let until = now + duration;
        log_warn!(
            "Credential {} rate limited, cooling down for {:?}",
            credential,
            duration
        );
        self.blocked.insert(credential.clone(), until);
    }

    pub fn clear(&self) {
        self.blocked.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_block_expires_after_window() {
        let tracker = RateLimitTracker::new();
        let key = Credential::new("k1");
        let start = Instant::now();

        assert!(!tracker.is_blocked(&key, start));
        tracker.block(&key, start, DEFAULT_RATE_LIMIT_COOLDOWN);

        assert!(tracker.is_blocked(&key, start + Duration::from_secs(60)));
        assert!(!tracker.is_blocked(&key, start + Duration::from_secs(61)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_blocks_are_per_credential() {
        let tracker = RateLimitTracker::new();
        let now = Instant::now();
        tracker.block(&Credential::new("k1"), now, Duration::from_secs(5));

        assert!(tracker.is_blocked(&Credential::new("k1"), now));
        assert!(!tracker.is_blocked(&Credential::new("k2"), now));
        assert_eq!(
            tracker.blocked_until(&Credential::new("k1"), now),
            Some(now + Duration::from_secs(5))
        );
    }
}
