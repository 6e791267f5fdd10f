use axum::extract::{Json, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use super::{TrustError, TrustedServerInfo};
use crate::http_server::api::client::{api_url, ApiRequest};
use crate::ServiceState;

#[derive(Debug, Clone, Default, Serialize, Deserialize, clap::Args)]
pub struct ListTrustRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListTrustResponse {
    pub servers: Vec<TrustedServerInfo>,
}

pub async fn handler(State(state): State<ServiceState>) -> Result<impl IntoResponse, TrustError> {
    let servers = state
        .trusted_servers()
        .list()
        .await?
        .into_iter()
        .map(TrustedServerInfo::from)
        .collect();

    Ok((http::StatusCode::OK, Json(ListTrustResponse { servers })).into_response())
}

impl ApiRequest for ListTrustRequest {
    type Response = ListTrustResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        client.get(api_url(base_url, "/api/v0/trust"))
    }
}
