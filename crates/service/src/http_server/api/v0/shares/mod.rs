//! A local user's view of the shares remote instances offered them

use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;

use common::share::ShareError;

use crate::ServiceState;

pub mod accept;
pub mod decline;
pub mod list;
pub mod purge;
pub mod remove;

pub use accept::{AcceptShareRequest, AcceptShareResponse};
pub use decline::{DeclineShareRequest, DeclineShareResponse};
pub use list::{ListSharesRequest, ListSharesResponse};
pub use purge::{PurgeSharesRequest, PurgeSharesResponse};
pub use remove::{RemoveShareRequest, RemoveShareResponse};

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/", get(list::handler))
        .route("/accept", post(accept::handler))
        .route("/decline", post(decline::handler))
        .route("/remove", post(remove::handler))
        .route("/purge", post(purge::handler))
        .with_state(state)
}

#[derive(Debug, thiserror::Error)]
pub enum SharesError {
    #[error(transparent)]
    Share(#[from] ShareError),
}

impl IntoResponse for SharesError {
    fn into_response(self) -> Response {
        let SharesError::Share(err) = self;
        match err {
            // hide whether a share exists from users it is not addressed to
            ShareError::NotFound | ShareError::AccessDenied(_) => {
                (http::StatusCode::NOT_FOUND, "Share not found").into_response()
            }
            ShareError::InvalidShare(msg) => (
                http::StatusCode::BAD_REQUEST,
                format!("Invalid share: {}", msg),
            )
                .into_response(),
            ShareError::MountPointExhausted(base) => (
                http::StatusCode::CONFLICT,
                format!("No free mount point for {}", base),
            )
                .into_response(),
            ShareError::Feedback { id, source } => (
                http::StatusCode::BAD_GATEWAY,
                format!("Share {} updated but the owner was not notified: {}", id, source),
            )
                .into_response(),
            ShareError::Store(e) => {
                tracing::error!("SHARES ERROR: {}", e);
                (
                    http::StatusCode::INTERNAL_SERVER_ERROR,
                    "unknown server error",
                )
                    .into_response()
            }
        }
    }
}
