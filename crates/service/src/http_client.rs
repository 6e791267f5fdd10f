//! Outbound HTTP for server-to-server calls, backed by reqwest.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};

use common::ports::{HttpClient, HttpResponse, TransportError, CONNECT_TIMEOUT, REQUEST_TIMEOUT};

#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }

    async fn send(&self, url: &str, request: RequestBuilder) -> Result<HttpResponse, TransportError> {
        let response = request.send().await.map_err(|e| transport_error(url, e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| transport_error(url, e))?;
        tracing::debug!(url, status, "outbound request finished");
        Ok(HttpResponse::new(status, body))
    }
}

fn transport_error(url: &str, err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(url.to_string())
    } else if err.is_connect() {
        TransportError::Connect(url.to_string())
    } else if err.is_builder() {
        TransportError::InvalidUrl(url.to_string())
    } else {
        TransportError::Other(err.to_string())
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<HttpResponse, TransportError> {
        self.send(url, self.client.post(url).form(form)).await
    }

    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<HttpResponse, TransportError> {
        self.send(url, self.client.post(url).json(body)).await
    }

    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        self.send(url, self.client.get(url)).await
    }
}
