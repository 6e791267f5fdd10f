use axum::extract::{Json, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::share::ExternalShare;

use super::SharesError;
use crate::http_server::api::client::{api_url, ApiRequest};
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct RemoveShareRequest {
    /// Local user removing the share
    #[arg(long)]
    pub user: String,

    /// Where the accepted share is mounted, e.g. /Docs
    #[arg(long)]
    pub mount_point: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveShareResponse {
    pub share: ExternalShare,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Json(req): Json<RemoveShareRequest>,
) -> Result<impl IntoResponse, SharesError> {
    let principal = state.principal(&req.user).await;
    let share = state
        .ledger()
        .remove_share(&principal, &req.mount_point)
        .await?;

    Ok((http::StatusCode::OK, Json(RemoveShareResponse { share })).into_response())
}

impl ApiRequest for RemoveShareRequest {
    type Response = RemoveShareResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        client.post(api_url(base_url, "/api/v0/shares/remove")).json(&self)
    }
}
