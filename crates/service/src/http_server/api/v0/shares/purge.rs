use axum::extract::{Json, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use super::SharesError;
use crate::http_server::api::client::{api_url, ApiRequest};
use crate::ServiceState;

/// Drop every share of a user that is being deleted
#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct PurgeSharesRequest {
    /// Local user being deleted
    #[arg(long)]
    pub user: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurgeSharesResponse {
    pub removed: usize,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Json(req): Json<PurgeSharesRequest>,
) -> Result<impl IntoResponse, SharesError> {
    let removed = state.ledger().remove_user_shares(&req.user).await?;

    Ok((http::StatusCode::OK, Json(PurgeSharesResponse { removed })).into_response())
}

impl ApiRequest for PurgeSharesRequest {
    type Response = PurgeSharesResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        client.post(api_url(base_url, "/api/v0/shares/purge")).json(&self)
    }
}
