use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;

use super::queue::RetryQueue;
use super::RetryTask;
use crate::cloud_id::host_key;
use crate::discovery::{
    endpoint_url, Discovery, DEFAULT_SHARED_SECRET_ENDPOINT, FEDERATED_SHARING,
    SHARED_SECRET_ENDPOINT,
};
use crate::ocs::{OcsEnvelope, SharedSecretData};
use crate::ports::{Clock, HttpClient, HttpResponse};
use crate::store::StoreError;
use crate::trust::{TrustStatus, TrustStore};

pub const DEFAULT_BASE_INTERVAL: Duration = Duration::from_secs(100);
pub const DEFAULT_GROWTH_FACTOR: u32 = 6;
pub const DEFAULT_MAX_RETRIES: u32 = 5;

#[derive(Debug, Clone)]
pub struct HandshakeConfig {
    /// Our own public URL, sent so the remote can call back
    pub self_origin: String,
    /// Administrative switch for federation; when off every queued
    ///  handshake is dropped on its next tick
    pub enabled: bool,
    /// Scale of the backoff. A task that has failed `n` times waits
    ///  `base_interval * growth_factor ^ n` (see [`Self::retry_interval`]),
    ///  so the wait after the first failure is already `base * growth`.
    pub base_interval: Duration,
    /// Multiplier applied to the wait per failed attempt
    pub growth_factor: u32,
    /// Attempts after which a handshake is abandoned
    pub max_retries: u32,
}

impl HandshakeConfig {
    pub fn new(self_origin: &str) -> Self {
        Self {
            self_origin: self_origin.to_string(),
            enabled: true,
            base_interval: DEFAULT_BASE_INTERVAL,
            growth_factor: DEFAULT_GROWTH_FACTOR,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// `base_interval * growth_factor ^ retry_count`, saturating.
    ///
    /// NOTE: with the defaults this is already 36 hours before the fifth
    ///  attempt. The growth is steep but remote instances rely on it.
    pub fn retry_interval(&self, retry_count: u32) -> Duration {
        self.growth_factor
            .checked_pow(retry_count)
            .and_then(|factor| self.base_interval.checked_mul(factor))
            .unwrap_or(Duration::MAX)
    }
}

/// Why a task was dropped without contacting the remote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillReason {
    RetryCapReached,
    NotTrusted,
    FederationDisabled,
}

impl std::fmt::Display for KillReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KillReason::RetryCapReached => write!(f, "retry cap reached"),
            KillReason::NotTrusted => write!(f, "host is no longer trusted"),
            KillReason::FederationDisabled => write!(f, "federation is disabled"),
        }
    }
}

/// Result of one scheduler tick for one task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The backoff window has not elapsed yet
    NotDue,
    /// Dropped before any network call
    Killed(KillReason),
    /// The remote handed over a shared secret
    Succeeded,
    /// The remote answered 403; not retried
    Refused,
    /// The remote answered 200 without a usable secret; not retried
    Malformed,
    /// Transient failure, the task will run again
    Retrying { retry_count: u32 },
    /// Another worker updated the task first
    Superseded,
}

#[derive(Debug, thiserror::Error)]
pub enum HandshakeError {
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Drives the shared-secret exchange with remote instances.
///
/// Each handshake is a [`RetryTask`]. A periodic driver calls
///  [`HandshakeScheduler::tick`] (or [`HandshakeScheduler::run_due`]); the
///  task either completes, is dropped, or is rescheduled with a growing
///  delay.
#[derive(Debug, Clone)]
pub struct HandshakeScheduler {
    trust: Arc<dyn TrustStore>,
    queue: Arc<dyn RetryQueue>,
    http: Arc<dyn HttpClient>,
    discovery: Arc<dyn Discovery>,
    clock: Arc<dyn Clock>,
    config: HandshakeConfig,
}

impl HandshakeScheduler {
    pub fn new(
        trust: Arc<dyn TrustStore>,
        queue: Arc<dyn RetryQueue>,
        http: Arc<dyn HttpClient>,
        discovery: Arc<dyn Discovery>,
        clock: Arc<dyn Clock>,
        config: HandshakeConfig,
    ) -> Self {
        Self {
            trust,
            queue,
            http,
            discovery,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &HandshakeConfig {
        &self.config
    }

    /// Queue a handshake with `host` using `token`
    pub async fn initiate(&self, host: &str, token: &str) -> Result<RetryTask, HandshakeError> {
        let task = self
            .queue
            .enqueue(RetryTask::new(host, token, self.clock.now()))
            .await?;
        tracing::info!(target_host = %task.target_host, "handshake scheduled");
        Ok(task)
    }

    /// Drop every queued handshake with `host`. Returns how many went away.
    pub async fn cancel(&self, host: &str) -> Result<usize, HandshakeError> {
        let key = host_key(host);
        let mut cancelled = 0;
        for task in self.queue.list().await? {
            if host_key(&task.target_host) == key {
                self.queue.remove(&task.target_host, &task.token).await?;
                cancelled += 1;
            }
        }
        if cancelled > 0 {
            tracing::info!(target_host = %key, cancelled, "handshakes cancelled");
        }
        Ok(cancelled)
    }

    /// Whether the backoff window for `task` has passed
    pub fn should_run(&self, task: &RetryTask, now: OffsetDateTime) -> bool {
        let Some(last_run_at) = task.last_run_at else {
            return true;
        };
        let interval = self.config.retry_interval(task.retry_count);
        let interval = time::Duration::try_from(interval).unwrap_or(time::Duration::MAX);
        now - last_run_at > interval
    }

    /// The reason `task` must be dropped, if any
    pub async fn kill_condition(&self, task: &RetryTask) -> Result<Option<KillReason>, HandshakeError> {
        if task.retry_count >= self.config.max_retries {
            return Ok(Some(KillReason::RetryCapReached));
        }
        if !self.config.enabled {
            return Ok(Some(KillReason::FederationDisabled));
        }
        if !self.trust.is_trusted(&task.target_host).await? {
            return Ok(Some(KillReason::NotTrusted));
        }
        Ok(None)
    }

    /// Run one attempt of `task` if it is due
    pub async fn tick(&self, task: &RetryTask) -> Result<TickOutcome, HandshakeError> {
        if let Some(reason) = self.kill_condition(task).await? {
            self.queue.remove(&task.target_host, &task.token).await?;
            if reason == KillReason::RetryCapReached {
                tracing::error!(
                    target_host = %task.target_host,
                    retries = task.retry_count,
                    "handshake abandoned, host stays untrusted until re-initiated"
                );
            } else {
                tracing::warn!(target_host = %task.target_host, %reason, "handshake dropped");
            }
            return Ok(TickOutcome::Killed(reason));
        }

        let now = self.clock.now();
        if !self.should_run(task, now) {
            return Ok(TickOutcome::NotDue);
        }

        let endpoint = endpoint_url(
            self.discovery.as_ref(),
            &task.target_host,
            FEDERATED_SHARING,
            SHARED_SECRET_ENDPOINT,
            DEFAULT_SHARED_SECRET_ENDPOINT,
        )
        .await;
        let url = format!("{}?format=json", endpoint);

        tracing::debug!(%task, %url, "requesting shared secret");
        let result = self
            .http
            .post_form(
                &url,
                &[
                    ("url", self.config.self_origin.as_str()),
                    ("token", task.token.as_str()),
                ],
            )
            .await;

        match result {
            Ok(response) if response.status == 200 => self.complete(task, &response).await,
            Ok(response) if response.status == 403 => {
                tracing::warn!(target_host = %task.target_host, "remote refused the handshake");
                self.mark_failed(task).await?;
                self.trust_op(self.trust.set_pending_token(&task.target_host, None))
                    .await?;
                self.queue.remove(&task.target_host, &task.token).await?;
                Ok(TickOutcome::Refused)
            }
            Ok(response) => {
                tracing::info!(
                    target_host = %task.target_host,
                    status = response.status,
                    "handshake attempt failed, will retry"
                );
                self.retry(task, now).await
            }
            Err(e) => {
                tracing::info!(target_host = %task.target_host, error = %e, "handshake attempt failed, will retry");
                self.retry(task, now).await
            }
        }
    }

    /// Tick every queued task once. Failures of individual tasks are
    ///  logged and do not stop the sweep.
    pub async fn run_due(&self) -> Result<Vec<(RetryTask, TickOutcome)>, HandshakeError> {
        let tasks = self.queue.list().await?;
        let mut outcomes = Vec::with_capacity(tasks.len());
        for task in tasks {
            match self.tick(&task).await {
                Ok(outcome) => outcomes.push((task, outcome)),
                Err(e) => tracing::error!(%task, error = %e, "handshake tick failed"),
            }
        }
        Ok(outcomes)
    }

    async fn complete(
        &self,
        task: &RetryTask,
        response: &HttpResponse,
    ) -> Result<TickOutcome, HandshakeError> {
        let secret = response
            .json::<OcsEnvelope<SharedSecretData>>()
            .ok()
            .and_then(|body| body.ocs.data)
            .and_then(|data| data.shared_secret)
            .filter(|secret| !secret.is_empty());

        let outcome = match secret {
            Some(secret) => {
                self.trust_op(self.trust.set_secret(&task.target_host, &secret))
                    .await?;
                tracing::info!(target_host = %task.target_host, "handshake completed");
                TickOutcome::Succeeded
            }
            None => {
                tracing::error!(
                    target_host = %task.target_host,
                    "remote answered the handshake without a shared secret"
                );
                self.mark_failed(task).await?;
                TickOutcome::Malformed
            }
        };

        self.queue.remove(&task.target_host, &task.token).await?;
        Ok(outcome)
    }

    async fn retry(&self, task: &RetryTask, now: OffsetDateTime) -> Result<TickOutcome, HandshakeError> {
        let updated = self
            .queue
            .reschedule(&task.target_host, &task.token, task.retry_count, now)
            .await?;
        if !updated {
            tracing::debug!(%task, "task changed under us, leaving it to the other worker");
            return Ok(TickOutcome::Superseded);
        }
        Ok(TickOutcome::Retrying {
            retry_count: task.retry_count + 1,
        })
    }

    async fn mark_failed(&self, task: &RetryTask) -> Result<(), HandshakeError> {
        self.trust_op(self.trust.set_status(&task.target_host, TrustStatus::Failure))
            .await
    }

    /// The host may have been removed while the request was in flight;
    ///  that is not worth failing the tick over
    async fn trust_op<F>(&self, op: F) -> Result<(), HandshakeError>
    where
        F: std::future::Future<Output = Result<(), StoreError>>,
    {
        match op.await {
            Ok(()) | Err(StoreError::NotFound) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_interval_growth() {
        let config = HandshakeConfig::new("https://a.example");
        assert_eq!(config.retry_interval(0), Duration::from_secs(100));
        // one failure already counts, so the first wait is base * growth
        assert_eq!(
            config.retry_interval(1),
            config.base_interval * config.growth_factor
        );
        assert_eq!(config.retry_interval(1), Duration::from_secs(600));
        assert_eq!(config.retry_interval(4), Duration::from_secs(129_600));
        assert_eq!(config.retry_interval(u32::MAX), Duration::MAX);
    }
}
