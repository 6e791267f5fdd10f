//! Trusted server administration
//!
//! Adding or resetting a server starts a handshake in the background; the
//!  response reports the status as of the request.

use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};

use common::trust::{TrustStatus, TrustedHost};
use common::trusted_servers::TrustedServersError;

use crate::ServiceState;

pub mod add;
pub mod list;
pub mod remove;
pub mod reset;

pub use add::AddTrustRequest;
pub use list::{ListTrustRequest, ListTrustResponse};
pub use remove::{RemoveTrustRequest, RemoveTrustResponse};
pub use reset::ResetTrustRequest;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/", post(add::handler))
        .route("/", get(list::handler))
        .route("/remove", post(remove::handler))
        .route("/reset", post(reset::handler))
        .with_state(state)
}

/// A trusted server as reported to administrators. The shared secret never
///  leaves the daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustedServerInfo {
    pub url: String,
    pub host_key: String,
    pub status: TrustStatus,
    pub established: bool,
    pub handshake_pending: bool,
}

impl From<TrustedHost> for TrustedServerInfo {
    fn from(host: TrustedHost) -> Self {
        Self {
            established: host.is_established(),
            handshake_pending: host.pending_token.is_some(),
            url: host.url,
            host_key: host.host_key,
            status: host.status,
        }
    }
}

impl std::fmt::Display for TrustedServerInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]", self.url, self.status)?;
        if self.handshake_pending {
            write!(f, " (handshake pending)")?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TrustError {
    #[error(transparent)]
    Servers(#[from] TrustedServersError),
}

impl IntoResponse for TrustError {
    fn into_response(self) -> Response {
        let TrustError::Servers(err) = self;
        match err {
            TrustedServersError::InvalidUrl(url) => (
                http::StatusCode::BAD_REQUEST,
                format!("Invalid server url: {}", url),
            )
                .into_response(),
            TrustedServersError::NotFound(url) => (
                http::StatusCode::NOT_FOUND,
                format!("Server not trusted: {}", url),
            )
                .into_response(),
            e => {
                tracing::error!("TRUST ERROR: {}", e);
                (
                    http::StatusCode::INTERNAL_SERVER_ERROR,
                    "unknown server error",
                )
                    .into_response()
            }
        }
    }
}
