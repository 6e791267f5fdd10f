#[allow(clippy::module_inception)]
mod client;
mod error;

pub use client::ApiClient;
pub use error::ApiError;

use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;

pub trait ApiRequest {
    type Response: DeserializeOwned;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder;
}

/// Absolute URL of a local API path, e.g. `api_url(base, "/api/v0/trust")`
pub(crate) fn api_url(base_url: &Url, path: &str) -> String {
    format!("{}{}", base_url.as_str().trim_end_matches('/'), path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url() {
        let base = Url::parse("http://localhost:3000").unwrap();
        assert_eq!(
            api_url(&base, "/api/v0/trust"),
            "http://localhost:3000/api/v0/trust"
        );
        let nested = Url::parse("http://localhost:3000/proxy/").unwrap();
        assert_eq!(
            api_url(&nested, "/api/v0/shares"),
            "http://localhost:3000/proxy/api/v0/shares"
        );
    }
}
