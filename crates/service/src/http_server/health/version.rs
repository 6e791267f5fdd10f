use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;

use common::prelude::build_info;

#[tracing::instrument]
pub async fn handler() -> Response {
    (StatusCode::OK, Json(build_info())).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::http_server::test_support::*;

    #[tokio::test]
    async fn test_handler_direct() {
        let response = handler().await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_status_routes() {
        let (state, _) = test_state(test_config()).await;
        let router = crate::http_server::router(state);

        let (status, body) = send(router.clone(), get("/_status/livez")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, _) = send(router.clone(), get("/_status/readyz")).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(router.clone(), get("/_status/version")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["pkg_version"].is_string());

        let (status, body) = send(router, get("/nowhere")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["msg"], "not found");
    }
}
