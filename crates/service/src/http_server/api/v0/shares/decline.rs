use axum::extract::{Json, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use super::SharesError;
use crate::http_server::api::client::{api_url, ApiRequest};
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct DeclineShareRequest {
    /// Local user declining the share
    #[arg(long)]
    pub user: String,

    /// Id of the share to decline
    #[arg(long)]
    pub id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeclineShareResponse {
    pub declined: bool,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Json(req): Json<DeclineShareRequest>,
) -> Result<impl IntoResponse, SharesError> {
    let principal = state.principal(&req.user).await;
    state.ledger().decline_share(&principal, req.id).await?;

    Ok((http::StatusCode::OK, Json(DeclineShareResponse { declined: true })).into_response())
}

impl ApiRequest for DeclineShareRequest {
    type Response = DeclineShareResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        client.post(api_url(base_url, "/api/v0/shares/decline")).json(&self)
    }
}
