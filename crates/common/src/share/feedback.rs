//! Telling the owning instance that a recipient accepted or declined.
//!
//! The modern path goes through a [`CloudNotifier`]. Remotes that do not
//!  speak it get the legacy OCS call
//!  `POST {endpoint}/{remote_id}/{accept|decline}` with the share token.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::discovery::{endpoint_url, Discovery, DEFAULT_SHARE_ENDPOINT, FEDERATED_SHARING, SHARE_ENDPOINT};
use crate::ocs::OcsEnvelope;
use crate::ports::{HttpClient, TransportError};

/// OCS status codes that mean the remote took the feedback
const OCS_SUCCESS_CODES: [u64; 2] = [100, 200];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackAction {
    Accept,
    Decline,
}

impl FeedbackAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackAction::Accept => "accept",
            FeedbackAction::Decline => "decline",
        }
    }

    pub fn kind(&self) -> NotificationKind {
        match self {
            FeedbackAction::Accept => NotificationKind::ShareAccepted,
            FeedbackAction::Decline => NotificationKind::ShareDeclined,
        }
    }
}

impl std::fmt::Display for FeedbackAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    #[serde(rename = "SHARE_ACCEPTED")]
    ShareAccepted,
    #[serde(rename = "SHARE_DECLINED")]
    ShareDeclined,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::ShareAccepted => "SHARE_ACCEPTED",
            NotificationKind::ShareDeclined => "SHARE_DECLINED",
        }
    }
}

/// A cloud federation notification about one share
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederationNotification {
    pub kind: NotificationKind,
    /// The share's id on the receiving (owning) side
    pub provider_id: String,
    pub shared_secret: String,
    pub message: String,
}

impl FederationNotification {
    pub fn new(action: FeedbackAction, remote_id: &str, token: &str) -> Self {
        let message = match action {
            FeedbackAction::Accept => "Recipient accepted the share",
            FeedbackAction::Decline => "Recipient declined the share",
        };
        Self {
            kind: action.kind(),
            provider_id: remote_id.to_string(),
            shared_secret: token.to_string(),
            message: message.to_string(),
        }
    }

    /// The JSON body cloud federation endpoints expect
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "notificationType": self.kind.as_str(),
            "resourceType": "file",
            "providerId": self.provider_id,
            "notification": {
                "sharedSecret": self.shared_secret,
                "message": self.message,
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotifyError {
    /// The remote does not advertise cloud federation notifications
    #[error("remote does not support federation notifications")]
    Unsupported,
    #[error("federation notification failed: {0}")]
    Failed(String),
}

/// Modern notification channel to a remote
#[async_trait]
pub trait CloudNotifier: Send + Sync + std::fmt::Debug {
    async fn send(
        &self,
        remote: &str,
        notification: &FederationNotification,
    ) -> Result<(), NotifyError>;
}

/// A notifier for deployments that only speak the legacy protocol
#[derive(Debug, Clone, Default)]
pub struct LegacyOnlyNotifier;

#[async_trait]
impl CloudNotifier for LegacyOnlyNotifier {
    async fn send(&self, _: &str, _: &FederationNotification) -> Result<(), NotifyError> {
        Err(NotifyError::Unsupported)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedbackError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("remote rejected the feedback (http {status}, ocs {ocs_status:?})")]
    Rejected {
        status: u16,
        ocs_status: Option<u64>,
    },
}

/// Which channel delivered a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackChannel {
    Notification,
    Legacy,
}

#[derive(Debug, Clone)]
pub struct Feedback {
    notifier: Arc<dyn CloudNotifier>,
    discovery: Arc<dyn Discovery>,
    http: Arc<dyn HttpClient>,
}

impl Feedback {
    pub fn new(
        notifier: Arc<dyn CloudNotifier>,
        discovery: Arc<dyn Discovery>,
        http: Arc<dyn HttpClient>,
    ) -> Self {
        Self {
            notifier,
            discovery,
            http,
        }
    }

    /// Tell `remote` that the share `remote_id` was accepted or declined
    pub async fn notify_remote(
        &self,
        remote: &str,
        token: &str,
        remote_id: &str,
        action: FeedbackAction,
    ) -> Result<FeedbackChannel, FeedbackError> {
        let notification = FederationNotification::new(action, remote_id, token);
        match self.notifier.send(remote, &notification).await {
            Ok(()) => {
                tracing::debug!(%remote, remote_id, %action, "feedback delivered as notification");
                return Ok(FeedbackChannel::Notification);
            }
            Err(NotifyError::Unsupported) => {
                tracing::debug!(%remote, "no notification support, using legacy feedback");
            }
            Err(e) => {
                tracing::info!(%remote, error = %e, "notification failed, using legacy feedback");
            }
        }

        let endpoint = endpoint_url(
            self.discovery.as_ref(),
            remote,
            FEDERATED_SHARING,
            SHARE_ENDPOINT,
            DEFAULT_SHARE_ENDPOINT,
        )
        .await;
        let url = format!("{}/{}/{}?format=json", endpoint, remote_id, action);

        let response = self.http.post_form(&url, &[("token", token)]).await?;
        let ocs_status = response
            .json::<OcsEnvelope<serde_json::Value>>()
            .ok()
            .and_then(|body| body.status_code());

        match ocs_status {
            Some(code) if OCS_SUCCESS_CODES.contains(&code) => {
                tracing::debug!(%remote, remote_id, %action, "legacy feedback delivered");
                Ok(FeedbackChannel::Legacy)
            }
            _ => Err(FeedbackError::Rejected {
                status: response.status,
                ocs_status,
            }),
        }
    }
}
