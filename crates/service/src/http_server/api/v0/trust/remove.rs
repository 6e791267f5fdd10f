use axum::extract::{Json, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use super::TrustError;
use crate::http_server::api::client::{api_url, ApiRequest};
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct RemoveTrustRequest {
    /// Base URL of the remote instance to stop trusting
    #[arg(long)]
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveTrustResponse {
    pub removed: bool,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Json(req): Json<RemoveTrustRequest>,
) -> Result<impl IntoResponse, TrustError> {
    state.trusted_servers().remove_server(&req.url).await?;

    Ok((http::StatusCode::OK, Json(RemoveTrustResponse { removed: true })).into_response())
}

impl ApiRequest for RemoveTrustRequest {
    type Response = RemoveTrustResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        client.post(api_url(base_url, "/api/v0/trust/remove")).json(&self)
    }
}
