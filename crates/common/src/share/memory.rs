use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use super::provider::ShareStore;
use super::{ExternalShare, ShareStatus};
use crate::store::StoreError;

/// In-memory share store. Rows are kept in id order.
#[derive(Debug, Clone, Default)]
pub struct MemoryShareStore {
    inner: Arc<RwLock<MemoryShareStoreInner>>,
}

#[derive(Debug, Default)]
struct MemoryShareStoreInner {
    next_id: i64,
    shares: BTreeMap<i64, ExternalShare>,
}

impl MemoryShareStoreInner {
    fn mount_point_taken(&self, recipient: &str, hash: &str, except: Option<i64>) -> bool {
        self.shares.values().any(|s| {
            Some(s.id) != except && s.recipient == recipient && s.mount_point_hash == hash
        })
    }

    fn member_row_taken(&self, parent_id: Option<i64>, recipient: &str) -> bool {
        parent_id.is_some_and(|parent| {
            self.shares
                .values()
                .any(|s| s.parent_id == Some(parent) && s.recipient == recipient)
        })
    }
}

impl MemoryShareStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryShareStoreInner>, StoreError> {
        self.inner
            .read()
            .map_err(|e| StoreError::Provider(format!("failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryShareStoreInner>, StoreError> {
        self.inner
            .write()
            .map_err(|e| StoreError::Provider(format!("failed to acquire write lock: {}", e)))
    }
}

#[async_trait]
impl ShareStore for MemoryShareStore {
    async fn insert(&self, mut share: ExternalShare) -> Result<ExternalShare, StoreError> {
        let mut inner = self.write()?;
        if inner.mount_point_taken(&share.recipient, &share.mount_point_hash, None)
            || inner.member_row_taken(share.parent_id, &share.recipient)
        {
            return Err(StoreError::Conflict);
        }

        inner.next_id += 1;
        share.id = inner.next_id;
        inner.shares.insert(share.id, share.clone());
        Ok(share)
    }

    async fn get(&self, id: i64) -> Result<Option<ExternalShare>, StoreError> {
        Ok(self.read()?.shares.get(&id).cloned())
    }

    async fn find_by_mount_point(
        &self,
        recipient: &str,
        mount_point_hash: &str,
    ) -> Result<Option<ExternalShare>, StoreError> {
        Ok(self
            .read()?
            .shares
            .values()
            .find(|s| s.recipient == recipient && s.mount_point_hash == mount_point_hash)
            .cloned())
    }

    async fn find_member_row(
        &self,
        parent_id: i64,
        user: &str,
    ) -> Result<Option<ExternalShare>, StoreError> {
        Ok(self
            .read()?
            .shares
            .values()
            .find(|s| s.parent_id == Some(parent_id) && s.recipient == user)
            .cloned())
    }

    async fn update_mount(
        &self,
        id: i64,
        mount_point: &str,
        mount_point_hash: &str,
        status: ShareStatus,
    ) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let recipient = match inner.shares.get(&id) {
            Some(share) => share.recipient.clone(),
            None => return Err(StoreError::NotFound),
        };
        if inner.mount_point_taken(&recipient, mount_point_hash, Some(id)) {
            return Err(StoreError::Conflict);
        }

        let share = inner.shares.get_mut(&id).ok_or(StoreError::NotFound)?;
        share.mount_point = mount_point.to_string();
        share.mount_point_hash = mount_point_hash.to_string();
        share.status = status;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        self.write()?.shares.remove(&id);
        Ok(())
    }

    async fn list_for(&self, recipients: &[String]) -> Result<Vec<ExternalShare>, StoreError> {
        Ok(self
            .read()?
            .shares
            .values()
            .filter(|s| recipients.contains(&s.recipient))
            .cloned()
            .collect())
    }

    async fn delete_by_recipient(&self, recipient: &str) -> Result<Vec<ExternalShare>, StoreError> {
        let mut inner = self.write()?;
        let parents: Vec<i64> = inner
            .shares
            .values()
            .filter(|s| s.recipient == recipient)
            .map(|s| s.id)
            .collect();

        let doomed: Vec<i64> = inner
            .shares
            .values()
            .filter(|s| {
                parents.contains(&s.id) || s.parent_id.is_some_and(|p| parents.contains(&p))
            })
            .map(|s| s.id)
            .collect();

        Ok(doomed
            .into_iter()
            .filter_map(|id| inner.shares.remove(&id))
            .collect())
    }
}
