//! User-facing activity log and error banner.
//!
//! Both are shared by every flow (batch, regeneration, story, single-shot).
//! Each update takes the lock for one synchronous step only.

use crate::{log_error, log_info};
use chrono::Local;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

pub const MAX_ACTIVITY_ENTRIES: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityEntry {
    /// Local wall-clock time, `HH:MM:SS`
    pub timestamp: String,
    pub level: ActivityLevel,
    pub message: String,
}

#[derive(Default)]
struct ActivityState {
    entries: VecDeque<ActivityEntry>,
    banner: Option<String>,
}

#[derive(Clone, Default)]
pub struct ActivityLog {
    state: Arc<RwLock<ActivityState>>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn info(&self, message: impl Into<String>) {
        let message = message.into();
        log_info!("{}", message);
        self.push(ActivityLevel::Info, message).await;
    }

    /// Record a failure in the log and append it to the error banner
    pub async fn error(&self, message: impl Into<String>) {
        let message = message.into();
        log_error!("{}", message);
        let mut state = self.state.write().await;
        state.banner = Some(match state.banner.take() {
            Some(existing) => format!("{}\n{}", existing, message),
            None => message.clone(),
        });
        Self::push_locked(&mut state, ActivityLevel::Error, message);
    }

    pub async fn banner(&self) -> Option<String> {
        self.state.read().await.banner.clone()
    }

    pub async fn dismiss_banner(&self) {
        self.state.write().await.banner = None;
    }

    /// Newest first
    pub async fn entries(&self) -> Vec<ActivityEntry> {
        self.state.read().await.entries.iter().cloned().collect()
    }

    pub async fn clear(&self) {
        self.state.write().await.entries.clear();
    }

    async fn push(&self, level: ActivityLevel, message: String) {
        let mut state = self.state.write().await;
        Self::push_locked(&mut state, level, message);
    }

    fn push_locked(state: &mut ActivityState, level: ActivityLevel, message: String) {
        state.entries.push_front(ActivityEntry {
            timestamp: Local::now().format("%H:%M:%S").to_string(),
            level,
            message,
        });
        state.entries.truncate(MAX_ACTIVITY_ENTRIES);
    }
}
