use async_trait::async_trait;
use time::OffsetDateTime;

use super::RetryTask;
use crate::store::StoreError;

/// Durable queue of outstanding handshakes.
///
/// Several workers may poll the same queue, so every mutation is a
///  conditional, idempotent operation rather than a read-modify-write.
#[async_trait]
pub trait RetryQueue: Send + Sync + std::fmt::Debug {
    /// Insert the task unless one already exists for the same
    ///  `(target_host, token)`; returns whichever task is stored
    async fn enqueue(&self, task: RetryTask) -> Result<RetryTask, StoreError>;

    async fn get(&self, target_host: &str, token: &str) -> Result<Option<RetryTask>, StoreError>;

    async fn list(&self) -> Result<Vec<RetryTask>, StoreError>;

    /// Bump the retry count and record the run, but only if the stored
    ///  count still equals `expected_retry_count`. Returns whether the row
    ///  was updated.
    async fn reschedule(
        &self,
        target_host: &str,
        token: &str,
        expected_retry_count: u32,
        ran_at: OffsetDateTime,
    ) -> Result<bool, StoreError>;

    /// Delete the task. Deleting an absent task is not an error.
    async fn remove(&self, target_host: &str, token: &str) -> Result<(), StoreError>;
}
