use axum::extract::{Json, Query, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::share::{ExternalShare, ShareFilter};

use super::SharesError;
use crate::http_server::api::client::{api_url, ApiRequest};
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct ListSharesRequest {
    /// Local user whose shares to list
    #[arg(long)]
    pub user: String,

    /// all, pending or accepted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    pub filter: Option<ShareFilter>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListSharesResponse {
    pub shares: Vec<ExternalShare>,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Query(req): Query<ListSharesRequest>,
) -> Result<impl IntoResponse, SharesError> {
    let principal = state.principal(&req.user).await;
    let shares = state
        .ledger()
        .get_shares(&principal, req.filter.unwrap_or_default())
        .await?;

    Ok((http::StatusCode::OK, Json(ListSharesResponse { shares })).into_response())
}

impl ApiRequest for ListSharesRequest {
    type Response = ListSharesResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        client.get(api_url(base_url, "/api/v0/shares")).query(&self)
    }
}
