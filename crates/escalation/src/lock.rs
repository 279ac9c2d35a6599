//! Per-task advisory locks.
//!
//! Serializes transitions on the same task within this process. Other
//! replicas are not covered; the status-last write order keeps records
//! interpretable when they race.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Lock table keyed by canonical task id.
#[derive(Debug, Default)]
pub struct TaskLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl TaskLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `task_id`.
    pub async fn acquire(&self, task_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Drop entries nobody holds or waits on
            locks.retain(|id, l| id == task_id || Arc::strong_count(l) > 1);
            Arc::clone(locks.entry(task_id.to_string()).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of tracked tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
