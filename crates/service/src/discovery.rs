//! Endpoint discovery against a remote's `/ocs-provider/` document, cached
//!  per host.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Deserialize;
use time::OffsetDateTime;

use common::cloud_id::host_key;
use common::discovery::{join_endpoint, Discovery};
use common::ports::{Clock, HttpClient};

pub const DEFAULT_DISCOVERY_TTL: Duration = Duration::from_secs(24 * 60 * 60);
/// Failed lookups are retried sooner than successful ones
pub const FAILED_DISCOVERY_TTL: Duration = Duration::from_secs(60 * 60);

const OCS_PROVIDER_PATH: &str = "/ocs-provider/";

#[derive(Debug, Default, Deserialize)]
struct ProviderDocument {
    #[serde(default)]
    services: HashMap<String, ServiceEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct ServiceEntry {
    #[serde(default)]
    endpoints: HashMap<String, serde_json::Value>,
}

type Services = HashMap<String, HashMap<String, String>>;

#[derive(Debug, Clone)]
struct CacheEntry {
    services: Services,
    fetched_at: OffsetDateTime,
    ttl: Duration,
}

impl CacheEntry {
    fn is_fresh(&self, now: OffsetDateTime) -> bool {
        now - self.fetched_at < self.ttl
    }
}

#[derive(Debug, Clone)]
pub struct CachedDiscovery {
    http: Arc<dyn HttpClient>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    cache: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl CachedDiscovery {
    pub fn new(http: Arc<dyn HttpClient>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            http,
            clock,
            ttl,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Forget everything learned about a remote
    pub fn invalidate(&self, remote: &str) {
        self.cache.write().remove(&host_key(remote));
    }

    async fn fetch(&self, remote: &str) -> Option<Services> {
        let url = join_endpoint(remote, OCS_PROVIDER_PATH);
        let response = match self.http.get(&url).await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(remote, error = %e, "discovery request failed");
                return None;
            }
        };
        if !response.is_success() {
            tracing::debug!(remote, status = response.status, "discovery not available");
            return None;
        }

        let document: ProviderDocument = match response.json() {
            Ok(document) => document,
            Err(e) => {
                tracing::debug!(remote, error = %e, "malformed discovery document");
                return None;
            }
        };

        let services = document
            .services
            .into_iter()
            .map(|(capability, entry)| {
                let endpoints = entry
                    .endpoints
                    .into_iter()
                    .filter_map(|(key, value)| value.as_str().map(|v| (key, v.to_string())))
                    .collect();
                (capability, endpoints)
            })
            .collect();
        Some(services)
    }
}

#[async_trait]
impl Discovery for CachedDiscovery {
    async fn discover(&self, remote: &str, capability: &str) -> HashMap<String, String> {
        let key = host_key(remote);
        let now = self.clock.now();

        let cached = self
            .cache
            .read()
            .get(&key)
            .filter(|entry| entry.is_fresh(now))
            .map(|entry| entry.services.get(capability).cloned().unwrap_or_default());
        if let Some(endpoints) = cached {
            return endpoints;
        }

        let (services, ttl) = match self.fetch(remote).await {
            Some(services) => (services, self.ttl),
            None => (Services::new(), FAILED_DISCOVERY_TTL.min(self.ttl)),
        };
        let endpoints = services.get(capability).cloned().unwrap_or_default();

        self.cache.write().insert(
            key,
            CacheEntry {
                services,
                fetched_at: now,
                ttl,
            },
        );
        endpoints
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use common::discovery::FEDERATED_SHARING;
    use common::ports::{HttpResponse, ManualClock, TransportError};
    use parking_lot::Mutex;

    #[derive(Debug, Default)]
    struct FakeHttp {
        answers: Mutex<Vec<Result<HttpResponse, TransportError>>>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeHttp {
        fn answer(&self, answer: Result<HttpResponse, TransportError>) {
            self.answers.lock().push(answer);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl HttpClient for FakeHttp {
        async fn post_form(
            &self,
            url: &str,
            _form: &[(&str, &str)],
        ) -> Result<HttpResponse, TransportError> {
            Err(TransportError::Connect(url.to_string()))
        }

        async fn post_json(
            &self,
            url: &str,
            _body: &serde_json::Value,
        ) -> Result<HttpResponse, TransportError> {
            Err(TransportError::Connect(url.to_string()))
        }

        async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
            self.calls.lock().push(url.to_string());
            let mut answers = self.answers.lock();
            if answers.is_empty() {
                return Err(TransportError::Connect(url.to_string()));
            }
            answers.remove(0)
        }
    }

    const DOCUMENT: &str = r#"{
        "version": 2,
        "services": {
            "FEDERATED_SHARING": {
                "version": 1,
                "endpoints": {"share": "/custom/shares", "webdav": "/dav", "weight": 3}
            }
        }
    }"#;

    fn discovery() -> (Arc<FakeHttp>, ManualClock, CachedDiscovery) {
        let http = Arc::new(FakeHttp::default());
        let clock = ManualClock::default();
        let discovery =
            CachedDiscovery::new(http.clone(), Arc::new(clock.clone()), DEFAULT_DISCOVERY_TTL);
        (http, clock, discovery)
    }

    #[tokio::test]
    async fn test_discover_parses_and_caches() {
        let (http, clock, discovery) = discovery();
        http.answer(Ok(HttpResponse::new(200, DOCUMENT)));

        let endpoints = discovery.discover("b.example", FEDERATED_SHARING).await;
        assert_eq!(endpoints.get("share").map(String::as_str), Some("/custom/shares"));
        assert!(!endpoints.contains_key("weight"));
        assert_eq!(http.calls(), vec!["https://b.example/ocs-provider".to_string()]);

        clock.advance(Duration::from_secs(60));
        let again = discovery
            .discover("https://b.example/", FEDERATED_SHARING)
            .await;
        assert_eq!(again, endpoints);
        assert!(discovery.discover("b.example", "UNKNOWN").await.is_empty());
        assert_eq!(http.calls().len(), 1);

        clock.advance(DEFAULT_DISCOVERY_TTL);
        discovery.discover("b.example", FEDERATED_SHARING).await;
        assert_eq!(http.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_failures_are_cached_briefly() {
        let (http, clock, discovery) = discovery();
        http.answer(Ok(HttpResponse::new(404, "")));

        assert!(discovery
            .discover("b.example", FEDERATED_SHARING)
            .await
            .is_empty());
        assert!(discovery
            .discover("b.example", FEDERATED_SHARING)
            .await
            .is_empty());
        assert_eq!(http.calls().len(), 1);

        http.answer(Ok(HttpResponse::new(200, DOCUMENT)));
        clock.advance(FAILED_DISCOVERY_TTL);
        let endpoints = discovery.discover("b.example", FEDERATED_SHARING).await;
        assert_eq!(endpoints.len(), 2);
        assert_eq!(http.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_garbage_document_yields_empty_map() {
        let (http, _clock, discovery) = discovery();
        http.answer(Ok(HttpResponse::new(200, "<html>")));
        assert!(discovery
            .discover("b.example", FEDERATED_SHARING)
            .await
            .is_empty());

        discovery.invalidate("b.example");
        http.answer(Ok(HttpResponse::new(200, DOCUMENT)));
        assert!(!discovery
            .discover("b.example", FEDERATED_SHARING)
            .await
            .is_empty());
    }
}
