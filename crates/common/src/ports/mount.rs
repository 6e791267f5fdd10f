use async_trait::async_trait;

use crate::share::ExternalShare;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MountError {
    #[error("mount operation failed: {0}")]
    Failed(String),
}

/// The storage layer that turns an accepted share into a browsable mount.
#[async_trait]
pub trait MountProvider: Send + Sync + std::fmt::Debug {
    /// Make an accepted share visible at its mount point
    async fn materialize(&self, share: &ExternalShare) -> Result<(), MountError>;

    /// Tear down the mount of a share that is going away
    async fn unmount(&self, share: &ExternalShare) -> Result<(), MountError>;

    /// Delete every share the recipient created from the given storage.
    ///  Returns how many were removed.
    async fn remove_reshares(&self, storage_id: &str) -> Result<usize, MountError>;
}
