use axum::extract::{Form, State};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use common::share::{NewShare, ShareError, ShareType};

use super::ocs_response;
use crate::ServiceState;

/// A share notification as remote instances post it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundShareForm {
    pub remote: String,
    pub token: String,
    pub name: String,
    pub owner: String,
    #[serde(rename = "shareWith")]
    pub share_with: String,
    #[serde(rename = "remoteId")]
    pub remote_id: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(rename = "shareType", default)]
    pub share_type: Option<String>,
}

impl From<InboundShareForm> for NewShare {
    fn from(form: InboundShareForm) -> Self {
        NewShare {
            remote: form.remote,
            token: form.token,
            password: form.password.filter(|p| !p.is_empty()),
            name: form.name,
            owner: form.owner,
            share_type: form
                .share_type
                .as_deref()
                .map(ShareType::from_str)
                .unwrap_or(ShareType::User),
            accepted: false,
            recipient: form.share_with,
            remote_id: form.remote_id,
            parent_id: None,
        }
    }
}

pub async fn handler(
    State(state): State<ServiceState>,
    Form(form): Form<InboundShareForm>,
) -> Result<impl IntoResponse, InboundShareError> {
    if !state.federation_enabled() {
        return Err(InboundShareError::FederationDisabled);
    }

    let share = state.ledger().receive_share(form.into()).await?;
    tracing::info!(
        id = share.id,
        remote = %share.remote,
        recipient = %share.recipient,
        "received federated share"
    );

    Ok(ocs_response(
        http::StatusCode::OK,
        "OK",
        serde_json::json!({}),
    ))
}

#[derive(Debug, thiserror::Error)]
pub enum InboundShareError {
    #[error("federation is disabled on this server")]
    FederationDisabled,
    #[error(transparent)]
    Share(#[from] ShareError),
}

impl IntoResponse for InboundShareError {
    fn into_response(self) -> Response {
        let empty = serde_json::json!([]);
        match self {
            InboundShareError::FederationDisabled => ocs_response(
                http::StatusCode::SERVICE_UNAVAILABLE,
                "Server does not support federated cloud sharing",
                empty,
            ),
            InboundShareError::Share(ShareError::InvalidShare(msg)) => {
                tracing::warn!("rejected inbound share: {}", msg);
                ocs_response(http::StatusCode::BAD_REQUEST, &msg, empty)
            }
            InboundShareError::Share(e) => {
                tracing::error!("INBOUND SHARE ERROR: {}", e);
                ocs_response(
                    http::StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error",
                    empty,
                )
            }
        }
    }
}
