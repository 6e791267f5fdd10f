use async_trait::async_trait;

use super::{TrustStatus, TrustedHost};
use crate::store::StoreError;

/// Persistence for trusted hosts.
///
/// Every `host` argument is a URL in any accepted spelling; providers key
///  rows by [`host_key`](crate::cloud_id::host_key) so `https://b.example/`
///  and `b.example` address the same row.
#[async_trait]
pub trait TrustStore: Send + Sync + std::fmt::Debug {
    /// Add a host with status `New`. Adding a host that is already present
    ///  returns the existing row untouched.
    async fn add(&self, url: &str) -> Result<TrustedHost, StoreError>;

    async fn get(&self, host: &str) -> Result<Option<TrustedHost>, StoreError>;

    async fn list(&self) -> Result<Vec<TrustedHost>, StoreError>;

    /// Forget a host entirely. Removing an absent host is not an error.
    async fn remove(&self, host: &str) -> Result<(), StoreError>;

    /// Record a completed handshake: stores the secret, sets status `Ok`
    ///  and clears the pending token
    async fn set_secret(&self, host: &str, secret: &str) -> Result<(), StoreError>;

    /// Set a status other than `Ok`. The shared secret is dropped since it
    ///  may only exist alongside `Ok`.
    async fn set_status(&self, host: &str, status: TrustStatus) -> Result<(), StoreError>;

    async fn set_pending_token(&self, host: &str, token: Option<&str>) -> Result<(), StoreError>;

    /// Whether the host is present at all, regardless of handshake status
    async fn is_trusted(&self, host: &str) -> Result<bool, StoreError> {
        Ok(self.get(host).await?.is_some())
    }

    /// Drop the secret and go back to `New` so the handshake runs again
    async fn reset(&self, host: &str) -> Result<(), StoreError> {
        self.set_status(host, TrustStatus::New).await
    }
}
