use axum::extract::{Json, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use super::{TrustError, TrustedServerInfo};
use crate::http_server::api::client::{api_url, ApiRequest};
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct AddTrustRequest {
    /// Base URL of the remote instance to trust
    #[arg(long)]
    pub url: String,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Json(req): Json<AddTrustRequest>,
) -> Result<impl IntoResponse, TrustError> {
    let host = state.trusted_servers().add_server(&req.url).await?;
    tracing::info!(host = %host.host_key, status = %host.status, "trusted server added");

    Ok((http::StatusCode::OK, Json(TrustedServerInfo::from(host))).into_response())
}

// Client implementation - builds request for this operation
impl ApiRequest for AddTrustRequest {
    type Response = TrustedServerInfo;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        client.post(api_url(base_url, "/api/v0/trust")).json(&self)
    }
}
