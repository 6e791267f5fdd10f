//! Administrator-facing trust management: adding, resetting and removing
//!  remote instances, each of which kicks off (or stops) a handshake.

use std::sync::Arc;

use crate::cloud_id::host_key;
use crate::handshake::{HandshakeDispatcher, HandshakeError, HandshakeJob, HandshakeScheduler};
use crate::store::StoreError;
use crate::trust::{generate_token, TrustStore, TrustedHost};

#[derive(Debug, thiserror::Error)]
pub enum TrustedServersError {
    #[error("invalid server url: {0:?}")]
    InvalidUrl(String),
    #[error("server not found: {0}")]
    NotFound(String),
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
    #[error("handshake error: {0}")]
    Handshake(#[from] HandshakeError),
}

#[derive(Debug, Clone)]
pub struct TrustedServers {
    trust: Arc<dyn TrustStore>,
    scheduler: HandshakeScheduler,
    dispatcher: Option<HandshakeDispatcher>,
}

impl TrustedServers {
    pub fn new(trust: Arc<dyn TrustStore>, scheduler: HandshakeScheduler) -> Self {
        Self {
            trust,
            scheduler,
            dispatcher: None,
        }
    }

    /// Wake the background driver whenever a handshake is queued
    pub fn with_dispatcher(mut self, dispatcher: HandshakeDispatcher) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Trust a remote and start the handshake with it. Adding a server
    ///  whose handshake already completed is a no-op.
    pub async fn add_server(&self, url: &str) -> Result<TrustedHost, TrustedServersError> {
        let key = host_key(url);
        if key.is_empty() || key.contains(char::is_whitespace) {
            return Err(TrustedServersError::InvalidUrl(url.to_string()));
        }

        let host = self.trust.add(url).await?;
        if host.is_established() {
            return Ok(host);
        }

        tracing::info!(host = %host.host_key, "trusting server");
        self.begin_handshake(&host).await
    }

    /// Drop the shared secret and run the handshake again. Handshakes still
    ///  queued with the old token are cancelled.
    pub async fn reset_server(&self, url: &str) -> Result<TrustedHost, TrustedServersError> {
        let host = self
            .trust
            .get(url)
            .await?
            .ok_or_else(|| TrustedServersError::NotFound(url.to_string()))?;

        tracing::info!(host = %host.host_key, "resetting trust");
        self.trust.reset(&host.url).await?;
        self.scheduler.cancel(&host.url).await?;
        self.begin_handshake(&host).await
    }

    /// Stop trusting a remote. Outstanding handshakes die on their next tick.
    pub async fn remove_server(&self, url: &str) -> Result<(), TrustedServersError> {
        tracing::info!(host = %host_key(url), "removing trusted server");
        self.trust.remove(url).await?;
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<TrustedHost>, TrustedServersError> {
        Ok(self.trust.list().await?)
    }

    pub async fn is_trusted_server(&self, url: &str) -> Result<bool, TrustedServersError> {
        Ok(self.trust.is_trusted(url).await?)
    }

    async fn begin_handshake(&self, host: &TrustedHost) -> Result<TrustedHost, TrustedServersError> {
        let token = generate_token();
        self.trust.set_pending_token(&host.url, Some(&token)).await?;
        self.scheduler.initiate(&host.url, &token).await?;

        if let Some(dispatcher) = &self.dispatcher {
            if let Err(e) = dispatcher.dispatch(HandshakeJob::RunDue) {
                tracing::warn!(error = %e, "failed to wake handshake driver");
            }
        }

        self.trust
            .get(&host.url)
            .await?
            .ok_or_else(|| TrustedServersError::NotFound(host.url.clone()))
    }
}
