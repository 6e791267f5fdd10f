use axum::Router;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tower_http::trace::{DefaultOnFailure, DefaultOnResponse};
use tower_http::LatencyUnit;

pub mod api;
mod config;
mod handlers;
mod health;
pub mod ocs;

pub use config::Config;

use crate::ServiceState;

const API_PREFIX: &str = "/api";
const OCS_PREFIX: &str = "/ocs/v2.php/cloud";
const STATUS_PREFIX: &str = "/_status";

/// All routes served by the daemon: `/_status`, the local `/api`, and
///  the federation endpoints remote instances call
pub fn router(state: ServiceState) -> Router {
    Router::new()
        .nest(STATUS_PREFIX, health::router(state.clone()))
        .nest(API_PREFIX, api::router(state.clone()))
        .nest(OCS_PREFIX, ocs::router(state.clone()))
        .fallback(handlers::not_found_handler)
        .with_state(state)
}

/// Run the HTTP server until the shutdown signal fires
pub async fn run_api(
    config: Config,
    state: ServiceState,
    mut shutdown_rx: watch::Receiver<()>,
) -> Result<(), HttpServerError> {
    let listen_addr = config.listen_addr;
    let log_level = config.log_level;
    let trace_layer = TraceLayer::new_for_http()
        .on_response(
            DefaultOnResponse::new()
                .include_headers(false)
                .level(log_level)
                .latency_unit(LatencyUnit::Micros),
        )
        .on_failure(DefaultOnFailure::new().latency_unit(LatencyUnit::Micros));

    let router = router(state).layer(trace_layer);

    tracing::info!(addr = ?listen_addr, "API server listening");
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
        })
        .await?;

    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum HttpServerError {
    #[error("an error occurred running the HTTP server: {0}")]
    ServingFailed(#[from] std::io::Error),
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use parking_lot::Mutex;
    use tower::ServiceExt;

    use common::handshake::HandshakeDispatcher;
    use common::ports::{HttpClient, HttpResponse, ManualClock, TransportError};

    use crate::{Config, Database, ServiceState};

    /// Outbound HTTP that answers every call with one scripted response
    #[derive(Debug)]
    pub struct CannedHttp {
        pub answer: Mutex<Result<HttpResponse, TransportError>>,
        pub calls: Mutex<Vec<String>>,
    }

    impl CannedHttp {
        pub fn unreachable() -> Self {
            Self {
                answer: Mutex::new(Err(TransportError::Connect("test".to_string()))),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn record(&self, url: &str) -> Result<HttpResponse, TransportError> {
            self.calls.lock().push(url.to_string());
            self.answer.lock().clone()
        }
    }

    #[async_trait]
    impl HttpClient for CannedHttp {
        async fn post_form(
            &self,
            url: &str,
            _form: &[(&str, &str)],
        ) -> Result<HttpResponse, TransportError> {
            self.record(url)
        }

        async fn post_json(
            &self,
            url: &str,
            _body: &serde_json::Value,
        ) -> Result<HttpResponse, TransportError> {
            self.record(url)
        }

        async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
            self.record(url)
        }
    }

    pub async fn test_state(config: Config) -> (ServiceState, Arc<CannedHttp>) {
        let database = Database::memory().await.unwrap();
        let http = Arc::new(CannedHttp::unreachable());
        let (dispatcher, _receiver) = HandshakeDispatcher::new();
        let state = ServiceState::new(
            &config,
            database,
            http.clone(),
            Arc::new(ManualClock::default()),
            dispatcher,
        );
        (state, http)
    }

    pub fn test_config() -> Config {
        let mut config = Config {
            self_origin: "https://a.example".to_string(),
            ..Config::default()
        };
        config.groups.insert(
            "research-group".to_string(),
            vec!["alice".to_string(), "bob".to_string()],
        );
        config
    }

    pub async fn send(router: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .method("GET")
            .uri(uri)
            .header("accept", "application/json")
            .body(Body::empty())
            .unwrap()
    }
}
