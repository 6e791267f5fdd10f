use async_trait::async_trait;

use super::{ExternalShare, ShareStatus};
use crate::store::StoreError;

/// Persistence for external shares.
///
/// `(recipient, mount_point_hash)` is unique across all rows, and a group
///  member holds at most one row per template (`(parent_id, recipient)`).
///  Writes that would break either fail with [`StoreError::Conflict`] and
///  change nothing.
#[async_trait]
pub trait ShareStore: Send + Sync + std::fmt::Debug {
    /// Insert a row and return it with its assigned id. The `id` of the
    ///  argument is ignored.
    async fn insert(&self, share: ExternalShare) -> Result<ExternalShare, StoreError>;

    async fn get(&self, id: i64) -> Result<Option<ExternalShare>, StoreError>;

    async fn find_by_mount_point(
        &self,
        recipient: &str,
        mount_point_hash: &str,
    ) -> Result<Option<ExternalShare>, StoreError>;

    /// The row a group member holds for the template `parent_id`
    async fn find_member_row(
        &self,
        parent_id: i64,
        user: &str,
    ) -> Result<Option<ExternalShare>, StoreError>;

    /// Move a row to a new mount point and status in one write
    async fn update_mount(
        &self,
        id: i64,
        mount_point: &str,
        mount_point_hash: &str,
        status: ShareStatus,
    ) -> Result<(), StoreError>;

    /// Delete a row. Deleting an absent row is not an error.
    async fn delete(&self, id: i64) -> Result<(), StoreError>;

    /// Every row addressed to any of `recipients`, ordered by id
    async fn list_for(&self, recipients: &[String]) -> Result<Vec<ExternalShare>, StoreError>;

    /// Every row addressed to `recipient`, ordered by id
    async fn list_by_recipient(&self, recipient: &str) -> Result<Vec<ExternalShare>, StoreError> {
        self.list_for(&[recipient.to_string()]).await
    }

    /// Delete every row addressed to `recipient` along with the member rows
    ///  hanging off them. Returns the deleted rows.
    async fn delete_by_recipient(&self, recipient: &str) -> Result<Vec<ExternalShare>, StoreError>;
}
