//! Endpoints remote instances call on us, answered in the OCS envelope
//!  they expect.

use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};

use common::ocs::OcsEnvelope;

use crate::ServiceState;

pub mod shares;

pub use shares::InboundShareForm;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/shares", post(shares::handler))
        .with_state(state)
}

/// Wrap `data` in an OCS envelope; the HTTP status mirrors the OCS one
pub fn ocs_response<T: serde::Serialize>(
    status: http::StatusCode,
    message: &str,
    data: T,
) -> Response {
    let envelope = OcsEnvelope::new(u64::from(status.as_u16()), message, data);
    (status, Json(envelope)).into_response()
}
