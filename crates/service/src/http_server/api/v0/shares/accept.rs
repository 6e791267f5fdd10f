use axum::extract::{Json, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::share::{ExternalShare, ShareError};

use super::SharesError;
use crate::http_server::api::client::{api_url, ApiRequest};
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct AcceptShareRequest {
    /// Local user accepting the share
    #[arg(long)]
    pub user: String,

    /// Id of the share to accept
    #[arg(long)]
    pub id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptShareResponse {
    pub share: ExternalShare,
    /// Set when the share is accepted locally but the owner could not be told
    pub feedback_error: Option<String>,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Json(req): Json<AcceptShareRequest>,
) -> Result<impl IntoResponse, SharesError> {
    let principal = state.principal(&req.user).await;

    let response = match state.ledger().accept_share(&principal, req.id).await {
        Ok(share) => AcceptShareResponse {
            share,
            feedback_error: None,
        },
        Err(ShareError::Feedback { id, source }) => {
            tracing::warn!(id, error = %source, "share accepted without notifying the owner");
            let share = state.ledger().get_share(&principal, id).await?;
            AcceptShareResponse {
                share,
                feedback_error: Some(source.to_string()),
            }
        }
        Err(e) => return Err(e.into()),
    };

    Ok((http::StatusCode::OK, Json(response)).into_response())
}

impl ApiRequest for AcceptShareRequest {
    type Response = AcceptShareResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        client.post(api_url(base_url, "/api/v0/shares/accept")).json(&self)
    }
}
