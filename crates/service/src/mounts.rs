//! Bookkeeping stand-in for the storage layer that actually mounts shares.
//!  It records which storage is visible where, so operators can see the
//!  effect of accepting and removing shares.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use common::ports::{MountError, MountProvider};
use common::share::ExternalShare;

/// One visible mount
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    pub recipient: String,
    pub mount_point: String,
    pub storage_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct MountRegistry {
    // (recipient, mount point) -> storage id
    mounts: Arc<RwLock<BTreeMap<(String, String), String>>>,
}

impl MountRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self) -> Vec<MountEntry> {
        self.mounts
            .read()
            .iter()
            .map(|((recipient, mount_point), storage_id)| MountEntry {
                recipient: recipient.clone(),
                mount_point: mount_point.clone(),
                storage_id: storage_id.clone(),
            })
            .collect()
    }

    pub fn is_mounted(&self, recipient: &str, mount_point: &str) -> bool {
        self.mounts
            .read()
            .contains_key(&(recipient.to_string(), mount_point.to_string()))
    }
}

#[async_trait]
impl MountProvider for MountRegistry {
    async fn materialize(&self, share: &ExternalShare) -> Result<(), MountError> {
        let key = (share.recipient.clone(), share.mount_point.clone());
        let storage_id = share.storage_id();

        let mut mounts = self.mounts.write();
        if let Some(existing) = mounts.get(&key) {
            if *existing != storage_id {
                return Err(MountError::Failed(format!(
                    "{} is already mounted for {}",
                    share.mount_point, share.recipient
                )));
            }
        }
        mounts.insert(key, storage_id);
        tracing::info!(
            recipient = %share.recipient,
            mount_point = %share.mount_point,
            "share mounted"
        );
        Ok(())
    }

    async fn unmount(&self, share: &ExternalShare) -> Result<(), MountError> {
        let removed = self
            .mounts
            .write()
            .remove(&(share.recipient.clone(), share.mount_point.clone()));
        if removed.is_some() {
            tracing::info!(
                recipient = %share.recipient,
                mount_point = %share.mount_point,
                "share unmounted"
            );
        }
        Ok(())
    }

    async fn remove_reshares(&self, storage_id: &str) -> Result<usize, MountError> {
        // no resharing through this registry
        tracing::debug!(storage_id, "no reshares to remove");
        Ok(0)
    }
}
