//! Cloud federation notifications, sent to the endpoint a remote advertises
//!  in its `/ocm-provider/` document.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use common::discovery::join_endpoint;
use common::ports::HttpClient;
use common::share::feedback::{CloudNotifier, FederationNotification, NotifyError};

const OCM_PROVIDER_PATH: &str = "/ocm-provider/";

#[derive(Debug, Deserialize)]
struct OcmProvider {
    #[serde(default = "enabled_by_default")]
    enabled: bool,
    #[serde(rename = "endPoint", default)]
    end_point: Option<String>,
}

fn enabled_by_default() -> bool {
    true
}

#[derive(Debug, Clone)]
pub struct OcmNotifier {
    http: Arc<dyn HttpClient>,
}

impl OcmNotifier {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self { http }
    }

    /// Where the remote accepts notifications, if it advertises anything
    async fn notification_url(&self, remote: &str) -> Result<String, NotifyError> {
        let url = join_endpoint(remote, OCM_PROVIDER_PATH);
        let response = self
            .http
            .get(&url)
            .await
            .map_err(|e| NotifyError::Failed(e.to_string()))?;
        if !response.is_success() {
            return Err(NotifyError::Unsupported);
        }

        let provider: OcmProvider = response.json().map_err(|_| NotifyError::Unsupported)?;
        match provider.end_point {
            Some(end_point) if provider.enabled && !end_point.trim().is_empty() => {
                Ok(format!("{}/notifications", join_endpoint(remote, end_point.trim())))
            }
            _ => Err(NotifyError::Unsupported),
        }
    }
}

#[async_trait]
impl CloudNotifier for OcmNotifier {
    async fn send(
        &self,
        remote: &str,
        notification: &FederationNotification,
    ) -> Result<(), NotifyError> {
        let url = self.notification_url(remote).await?;
        let response = self
            .http
            .post_json(&url, &notification.to_json())
            .await
            .map_err(|e| NotifyError::Failed(e.to_string()))?;

        if response.is_success() {
            tracing::debug!(remote, kind = notification.kind.as_str(), "notification delivered");
            Ok(())
        } else {
            Err(NotifyError::Failed(format!(
                "{} answered http {}",
                url, response.status
            )))
        }
    }
}
