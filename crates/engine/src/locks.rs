//! Per-task mutual exclusion.
//!
//! Every transition of a task runs while holding that task's lock, so a
//! confirmation and a timeout for the same task are applied one after the
//! other. Locks of different tasks never contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use sprout_core::types::DbId;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Default)]
pub struct TaskLocks {
    inner: Mutex<HashMap<DbId, Arc<AsyncMutex<()>>>>,
}

impl TaskLocks {
    /// Wait for exclusive access to `task_id`.
    pub async fn lock(&self, task_id: DbId) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            // Drop entries nobody holds or waits on.
            map.retain(|_, m| Arc::strong_count(m) > 1);
            Arc::clone(map.entry(task_id).or_default())
        };
        mutex.lock_owned().await
    }

    /// Number of tasks currently locked or waited on.
    pub fn active(&self) -> usize {
        let map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        map.values().filter(|m| Arc::strong_count(m) > 1).count()
    }
}
