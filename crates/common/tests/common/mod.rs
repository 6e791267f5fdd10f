//! Shared test utilities: scripted collaborators and a wired-up harness
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use common::discovery::StaticDiscovery;
use common::handshake::{HandshakeConfig, HandshakeScheduler, MemoryRetryQueue};
use common::ports::{HttpClient, HttpResponse, ManualClock, MountError, MountProvider, TransportError};
use common::share::{
    CloudNotifier, ExternalShare, Feedback, FederationNotification, LedgerConfig, MemoryShareStore,
    NewShare, NotifyError, ShareLedger, ShareType,
};
use common::trust::MemoryTrustStore;
use common::trusted_servers::TrustedServers;

pub const SELF_ORIGIN: &str = "https://a.example";
pub const REMOTE: &str = "https://b.example";
pub const SHARED_SECRET_URL: &str =
    "https://b.example/ocs/v2.php/apps/federation/api/v1/shared-secret?format=json";

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Form(Vec<(String, String)>),
    Json(serde_json::Value),
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub url: String,
    pub body: RequestBody,
}

impl RecordedRequest {
    pub fn form_value(&self, key: &str) -> Option<&str> {
        match &self.body {
            RequestBody::Form(pairs) => pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }
}

type Scripted = Result<HttpResponse, TransportError>;

/// An HTTP client that answers from queued responses. A request whose URL
///  contains a route's pattern takes that route's next response; anything
///  unscripted fails to connect.
#[derive(Debug, Default)]
pub struct ScriptedHttp {
    routes: Mutex<Vec<(String, VecDeque<Scripted>)>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, pattern: &str, status: u16, body: &str) {
        self.push(pattern, Ok(HttpResponse::new(status, body)));
    }

    pub fn fail(&self, pattern: &str, error: TransportError) {
        self.push(pattern, Err(error));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn requests_to(&self, pattern: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.url.contains(pattern))
            .collect()
    }

    fn push(&self, pattern: &str, response: Scripted) {
        let mut routes = self.routes.lock();
        match routes.iter_mut().find(|(p, _)| p == pattern) {
            Some((_, queue)) => queue.push_back(response),
            None => routes.push((pattern.to_string(), VecDeque::from([response]))),
        }
    }

    fn answer(&self, url: &str, body: RequestBody) -> Scripted {
        self.requests.lock().push(RecordedRequest {
            url: url.to_string(),
            body,
        });
        let mut routes = self.routes.lock();
        routes
            .iter_mut()
            .filter(|(pattern, _)| url.contains(pattern.as_str()))
            .find_map(|(_, queue)| queue.pop_front())
            .unwrap_or_else(|| Err(TransportError::Connect(url.to_string())))
    }
}

#[async_trait]
impl HttpClient for ScriptedHttp {
    async fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Scripted {
        let pairs = form
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.answer(url, RequestBody::Form(pairs))
    }

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Scripted {
        self.answer(url, RequestBody::Json(body.clone()))
    }

    async fn get(&self, url: &str) -> Scripted {
        self.answer(url, RequestBody::Empty)
    }
}

/// Mount layer that records what it was asked to do
#[derive(Debug, Default)]
pub struct RecordingMounts {
    pub materialized: Mutex<Vec<ExternalShare>>,
    pub unmounted: Mutex<Vec<ExternalShare>>,
    pub reshare_removals: Mutex<Vec<String>>,
    pub fail_materialize: Mutex<bool>,
}

#[async_trait]
impl MountProvider for RecordingMounts {
    async fn materialize(&self, share: &ExternalShare) -> Result<(), MountError> {
        if *self.fail_materialize.lock() {
            return Err(MountError::Failed("disk full".to_string()));
        }
        self.materialized.lock().push(share.clone());
        Ok(())
    }

    async fn unmount(&self, share: &ExternalShare) -> Result<(), MountError> {
        self.unmounted.lock().push(share.clone());
        Ok(())
    }

    async fn remove_reshares(&self, storage_id: &str) -> Result<usize, MountError> {
        self.reshare_removals.lock().push(storage_id.to_string());
        Ok(0)
    }
}

/// Notifier with a fixed answer that records every notification
#[derive(Debug)]
pub struct RecordingNotifier {
    pub answer: Mutex<Result<(), NotifyError>>,
    pub sent: Mutex<Vec<(String, FederationNotification)>>,
}

impl Default for RecordingNotifier {
    fn default() -> Self {
        Self {
            answer: Mutex::new(Err(NotifyError::Unsupported)),
            sent: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl CloudNotifier for RecordingNotifier {
    async fn send(
        &self,
        remote: &str,
        notification: &FederationNotification,
    ) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .push((remote.to_string(), notification.clone()));
        self.answer.lock().clone()
    }
}

/// Every component wired to in-memory stores and scripted collaborators
pub struct Harness {
    pub trust: Arc<MemoryTrustStore>,
    pub queue: Arc<MemoryRetryQueue>,
    pub shares: Arc<MemoryShareStore>,
    pub http: Arc<ScriptedHttp>,
    pub clock: ManualClock,
    pub mounts: Arc<RecordingMounts>,
    pub notifier: Arc<RecordingNotifier>,
    pub scheduler: HandshakeScheduler,
    pub trusted_servers: TrustedServers,
    pub ledger: ShareLedger,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(HandshakeConfig::new(SELF_ORIGIN), LedgerConfig::default())
    }

    pub fn with_ledger_config(ledger_config: LedgerConfig) -> Self {
        Self::with_config(HandshakeConfig::new(SELF_ORIGIN), ledger_config)
    }

    pub fn with_config(handshake_config: HandshakeConfig, ledger_config: LedgerConfig) -> Self {
        let trust = Arc::new(MemoryTrustStore::new());
        let queue = Arc::new(MemoryRetryQueue::new());
        let shares = Arc::new(MemoryShareStore::new());
        let http = Arc::new(ScriptedHttp::new());
        let clock = ManualClock::default();
        let mounts = Arc::new(RecordingMounts::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let discovery = Arc::new(StaticDiscovery::new());

        let scheduler = HandshakeScheduler::new(
            trust.clone(),
            queue.clone(),
            http.clone(),
            discovery.clone(),
            Arc::new(clock.clone()),
            handshake_config,
        );
        let trusted_servers = TrustedServers::new(trust.clone(), scheduler.clone());
        let feedback = Feedback::new(notifier.clone(), discovery, http.clone());
        let ledger = ShareLedger::new(
            shares.clone(),
            trust.clone(),
            mounts.clone(),
            feedback,
            ledger_config,
        );

        Self {
            trust,
            queue,
            shares,
            http,
            clock,
            mounts,
            notifier,
            scheduler,
            trusted_servers,
            ledger,
        }
    }

    /// Make the next legacy feedback call to the remote succeed
    pub fn accept_feedback(&self) {
        self.http.respond(
            "/ocs/v2.php/cloud/shares/",
            200,
            r#"{"ocs":{"meta":{"status":"ok","statuscode":200},"data":[]}}"#,
        );
    }
}

pub fn secret_body(secret: &str) -> String {
    format!(
        r#"{{"ocs":{{"meta":{{"statuscode":200}},"data":{{"sharedSecret":"{}"}}}}}}"#,
        secret
    )
}

pub fn new_share(recipient: &str, name: &str, share_type: ShareType) -> NewShare {
    NewShare {
        remote: REMOTE.to_string(),
        token: format!("token-{}", name.to_lowercase()),
        password: None,
        name: name.to_string(),
        owner: "bob".to_string(),
        share_type,
        accepted: false,
        recipient: recipient.to_string(),
        remote_id: "17".to_string(),
        parent_id: None,
    }
}
