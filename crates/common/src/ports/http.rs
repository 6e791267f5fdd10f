use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

/// Upper bound on establishing a connection to a remote instance
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
/// Upper bound on a whole outbound request, connection included
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// Failures below the HTTP layer. Every variant is retryable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("could not connect to {0}")]
    Connect(String),
    #[error("request to {0} timed out")]
    Timeout(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("request failed: {0}")]
    Other(String),
}

/// Outbound HTTP used for every server-to-server call.
///
/// Implementations must apply [`CONNECT_TIMEOUT`] and [`REQUEST_TIMEOUT`]
///  so a single unreachable remote cannot stall a caller.
#[async_trait]
pub trait HttpClient: Send + Sync + std::fmt::Debug {
    /// POST an `application/x-www-form-urlencoded` body
    async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<HttpResponse, TransportError>;

    /// POST a JSON body
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<HttpResponse, TransportError>;

    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;
}
