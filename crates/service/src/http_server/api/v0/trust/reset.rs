use axum::extract::{Json, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use super::{TrustError, TrustedServerInfo};
use crate::http_server::api::client::{api_url, ApiRequest};
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct ResetTrustRequest {
    /// Base URL of the trusted instance to run the handshake with again
    #[arg(long)]
    pub url: String,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Json(req): Json<ResetTrustRequest>,
) -> Result<impl IntoResponse, TrustError> {
    let host = state.trusted_servers().reset_server(&req.url).await?;

    Ok((http::StatusCode::OK, Json(TrustedServerInfo::from(host))).into_response())
}

impl ApiRequest for ResetTrustRequest {
    type Response = TrustedServerInfo;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        client.post(api_url(base_url, "/api/v0/trust/reset")).json(&self)
    }
}
