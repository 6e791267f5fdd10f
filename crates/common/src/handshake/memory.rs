use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use time::OffsetDateTime;

use super::queue::RetryQueue;
use super::RetryTask;
use crate::store::StoreError;

/// In-memory retry queue keyed by `(target_host, token)`
#[derive(Debug, Clone, Default)]
pub struct MemoryRetryQueue {
    inner: Arc<RwLock<BTreeMap<(String, String), RetryTask>>>,
}

impl MemoryRetryQueue {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Provider(format!("failed to acquire lock: {}", e))
}

#[async_trait]
impl RetryQueue for MemoryRetryQueue {
    async fn enqueue(&self, task: RetryTask) -> Result<RetryTask, StoreError> {
        let mut inner = self.inner.write().map_err(lock_error)?;
        let stored = inner
            .entry((task.target_host.clone(), task.token.clone()))
            .or_insert(task);
        Ok(stored.clone())
    }

    async fn get(&self, target_host: &str, token: &str) -> Result<Option<RetryTask>, StoreError> {
        let inner = self.inner.read().map_err(lock_error)?;
        Ok(inner
            .get(&(target_host.to_string(), token.to_string()))
            .cloned())
    }

    async fn list(&self) -> Result<Vec<RetryTask>, StoreError> {
        let inner = self.inner.read().map_err(lock_error)?;
        Ok(inner.values().cloned().collect())
    }

    async fn reschedule(
        &self,
        target_host: &str,
        token: &str,
        expected_retry_count: u32,
        ran_at: OffsetDateTime,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().map_err(lock_error)?;
        match inner.get_mut(&(target_host.to_string(), token.to_string())) {
            Some(task) if task.retry_count == expected_retry_count => {
                task.retry_count += 1;
                task.last_run_at = Some(ran_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn remove(&self, target_host: &str, token: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().map_err(lock_error)?;
        inner.remove(&(target_host.to_string(), token.to_string()));
        Ok(())
    }
}
