//! Endpoint discovery for remote instances.
//!
//! A remote advertises where its federation endpoints live per capability;
//!  when it advertises nothing we fall back to well-known default paths.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::cloud_id::{host_key, normalize_remote};

/// Capability covering shares and the trust handshake
pub const FEDERATED_SHARING: &str = "FEDERATED_SHARING";
/// Key of the share feedback endpoint within [`FEDERATED_SHARING`]
pub const SHARE_ENDPOINT: &str = "share";
/// Key of the shared-secret exchange endpoint within [`FEDERATED_SHARING`]
pub const SHARED_SECRET_ENDPOINT: &str = "shared-secret";

pub const DEFAULT_SHARE_ENDPOINT: &str = "/ocs/v2.php/cloud/shares";
pub const DEFAULT_SHARED_SECRET_ENDPOINT: &str = "/ocs/v2.php/apps/federation/api/v1/shared-secret";

/// Per-remote capability lookup. Never fails: an unreachable remote or an
///  unknown capability yields an empty map.
#[async_trait]
pub trait Discovery: Send + Sync + std::fmt::Debug {
    async fn discover(&self, remote: &str, capability: &str) -> HashMap<String, String>;
}

/// Resolve the absolute URL of one endpoint, using `default` when the
///  remote does not advertise it
pub async fn endpoint_url(
    discovery: &dyn Discovery,
    remote: &str,
    capability: &str,
    key: &str,
    default: &str,
) -> String {
    let endpoints = discovery.discover(remote, capability).await;
    let path = endpoints
        .get(key)
        .filter(|p| !p.is_empty())
        .map(String::as_str)
        .unwrap_or(default);
    join_endpoint(remote, path)
}

/// Prefix `https://` onto remotes stored without a scheme
pub fn remote_base(remote: &str) -> String {
    let remote = normalize_remote(remote.trim());
    if remote.contains("://") {
        remote.to_string()
    } else {
        format!("https://{}", remote)
    }
}

/// Join an advertised endpoint onto a remote. Absolute endpoints win.
pub fn join_endpoint(remote: &str, endpoint: &str) -> String {
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        return endpoint.trim_end_matches('/').to_string();
    }
    format!(
        "{}/{}",
        remote_base(remote),
        endpoint.trim_start_matches('/').trim_end_matches('/')
    )
}

/// Discovery answers from a fixed table, keyed by remote host key
#[derive(Debug, Clone, Default)]
pub struct StaticDiscovery {
    entries: HashMap<(String, String), HashMap<String, String>>,
}

impl StaticDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endpoint(mut self, remote: &str, capability: &str, key: &str, path: &str) -> Self {
        self.entries
            .entry((host_key(remote), capability.to_string()))
            .or_default()
            .insert(key.to_string(), path.to_string());
        self
    }
}

#[async_trait]
impl Discovery for StaticDiscovery {
    async fn discover(&self, remote: &str, capability: &str) -> HashMap<String, String> {
        self.entries
            .get(&(host_key(remote), capability.to_string()))
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_base() {
        assert_eq!(remote_base("b.example"), "https://b.example");
        assert_eq!(remote_base("http://b.example/"), "http://b.example");
        assert_eq!(remote_base("https://b.example/index.php"), "https://b.example");
    }

    #[test]
    fn test_join_endpoint() {
        assert_eq!(
            join_endpoint("https://b.example/", "/ocs/v2.php/cloud/shares"),
            "https://b.example/ocs/v2.php/cloud/shares"
        );
        assert_eq!(
            join_endpoint("b.example", "https://api.b.example/shares/"),
            "https://api.b.example/shares"
        );
    }

    #[tokio::test]
    async fn test_endpoint_url_falls_back_to_default() {
        let discovery = StaticDiscovery::new().with_endpoint(
            "https://a.example",
            FEDERATED_SHARING,
            SHARE_ENDPOINT,
            "/custom/shares",
        );

        let advertised = endpoint_url(
            &discovery,
            "https://a.example",
            FEDERATED_SHARING,
            SHARE_ENDPOINT,
            DEFAULT_SHARE_ENDPOINT,
        )
        .await;
        assert_eq!(advertised, "https://a.example/custom/shares");

        let fallback = endpoint_url(
            &discovery,
            "https://b.example",
            FEDERATED_SHARING,
            SHARE_ENDPOINT,
            DEFAULT_SHARE_ENDPOINT,
        )
        .await;
        assert_eq!(fallback, "https://b.example/ocs/v2.php/cloud/shares");
    }
}
