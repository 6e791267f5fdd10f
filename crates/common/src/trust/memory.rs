use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use super::provider::TrustStore;
use super::{TrustStatus, TrustedHost};
use crate::cloud_id::host_key;
use crate::store::StoreError;

/// In-memory trust store keyed by host key
#[derive(Debug, Clone, Default)]
pub struct MemoryTrustStore {
    inner: Arc<RwLock<MemoryTrustStoreInner>>,
}

#[derive(Debug, Default)]
struct MemoryTrustStoreInner {
    next_id: i64,
    hosts: BTreeMap<String, TrustedHost>,
}

impl MemoryTrustStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryTrustStoreInner>, StoreError> {
        self.inner
            .read()
            .map_err(|e| StoreError::Provider(format!("failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryTrustStoreInner>, StoreError> {
        self.inner
            .write()
            .map_err(|e| StoreError::Provider(format!("failed to acquire write lock: {}", e)))
    }

    fn update<F>(&self, host: &str, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut TrustedHost),
    {
        let mut inner = self.write()?;
        let row = inner
            .hosts
            .get_mut(&host_key(host))
            .ok_or(StoreError::NotFound)?;
        f(row);
        Ok(())
    }
}

#[async_trait]
impl TrustStore for MemoryTrustStore {
    async fn add(&self, url: &str) -> Result<TrustedHost, StoreError> {
        let mut inner = self.write()?;
        let key = host_key(url);
        if let Some(existing) = inner.hosts.get(&key) {
            return Ok(existing.clone());
        }

        inner.next_id += 1;
        let host = TrustedHost::new(inner.next_id, url);
        inner.hosts.insert(key, host.clone());
        Ok(host)
    }

    async fn get(&self, host: &str) -> Result<Option<TrustedHost>, StoreError> {
        Ok(self.read()?.hosts.get(&host_key(host)).cloned())
    }

    async fn list(&self) -> Result<Vec<TrustedHost>, StoreError> {
        let mut hosts: Vec<TrustedHost> = self.read()?.hosts.values().cloned().collect();
        hosts.sort_by_key(|h| h.id);
        Ok(hosts)
    }

    async fn remove(&self, host: &str) -> Result<(), StoreError> {
        self.write()?.hosts.remove(&host_key(host));
        Ok(())
    }

    async fn set_secret(&self, host: &str, secret: &str) -> Result<(), StoreError> {
        self.update(host, |row| {
            row.shared_secret = Some(secret.to_string());
            row.status = TrustStatus::Ok;
            row.pending_token = None;
        })
    }

    async fn set_status(&self, host: &str, status: TrustStatus) -> Result<(), StoreError> {
        self.update(host, |row| {
            row.status = status;
            if status != TrustStatus::Ok {
                row.shared_secret = None;
            }
        })
    }

    async fn set_pending_token(&self, host: &str, token: Option<&str>) -> Result<(), StoreError> {
        self.update(host, |row| {
            row.pending_token = token.map(str::to_string);
        })
    }
}
