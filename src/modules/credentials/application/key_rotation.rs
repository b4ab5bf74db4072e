use crate::modules::credentials::domain::{Credential, CredentialPool};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Round-robin credential picker for single-shot calls.
///
/// Batch runs do not use this; each batch worker stays bound to one key.
#[derive(Clone)]
pub struct KeyRotation {
    pool: CredentialPool,
    counter: Arc<AtomicUsize>,
}

impl KeyRotation {
    pub fn new(pool: CredentialPool) -> Self {
        Self {
            pool,
            counter: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// `None` only when the pool is empty
    pub fn next_credential(&self) -> Option<Credential> {
        let len = self.pool.len();
        if len == 0 {
            return None;
        }
        let ticket = self.counter.fetch_add(1, Ordering::Relaxed);
        self.pool.get(ticket % len)
    }

    pub fn pool(&self) -> &CredentialPool {
        &self.pool
    }
}
