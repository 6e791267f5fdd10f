use std::sync::Arc;

use url::Url;

use common::handshake::{HandshakeDispatcher, HandshakeScheduler};
use common::ports::{Clock, GroupMembership, HttpClient, StaticGroups, SystemClock};
use common::share::{Feedback, Principal, ShareLedger};
use common::trusted_servers::TrustedServers;

use super::config::Config;
use super::database::{Database, DatabaseSetupError};
use super::discovery::CachedDiscovery;
use super::http_client::ReqwestHttpClient;
use super::mounts::MountRegistry;
use super::notifier::OcmNotifier;

/// Main service state - wires the stores and adapters into the domain core
#[derive(Debug, Clone)]
pub struct State {
    database: Database,
    scheduler: HandshakeScheduler,
    trusted_servers: TrustedServers,
    ledger: ShareLedger,
    groups: Arc<dyn GroupMembership>,
    mounts: MountRegistry,
    dispatcher: HandshakeDispatcher,
    federation_enabled: bool,
}

impl State {
    pub async fn from_config(
        config: &Config,
        dispatcher: HandshakeDispatcher,
    ) -> Result<Self, StateSetupError> {
        // 1. Setup database
        let sqlite_database_url = match config.sqlite_path {
            Some(ref path) => {
                // check that the path exists
                if !path.exists() {
                    return Err(StateSetupError::DatabasePathDoesNotExist);
                }
                // parse the path into a URL
                Url::parse(&format!("sqlite://{}", path.display()))
                    .map_err(|_| StateSetupError::InvalidDatabaseUrl)
            }
            // otherwise just set up an in-memory database
            None => Url::parse("sqlite::memory:").map_err(|_| StateSetupError::InvalidDatabaseUrl),
        }?;
        tracing::info!("Database URL: {:?}", sqlite_database_url);
        let database = Database::connect(&sqlite_database_url).await?;

        // 2. Outbound HTTP, shared by the handshake, discovery and feedback
        let http = ReqwestHttpClient::new().map_err(|e| StateSetupError::HttpClient(e.to_string()))?;

        Ok(Self::new(
            config,
            database,
            Arc::new(http),
            Arc::new(SystemClock),
            dispatcher,
        ))
    }

    /// Assemble the state around an already connected database
    pub fn new(
        config: &Config,
        database: Database,
        http: Arc<dyn HttpClient>,
        clock: Arc<dyn Clock>,
        dispatcher: HandshakeDispatcher,
    ) -> Self {
        let discovery = Arc::new(CachedDiscovery::new(
            http.clone(),
            clock.clone(),
            config.discovery_ttl,
        ));
        let trust = Arc::new(database.clone());

        let scheduler = HandshakeScheduler::new(
            trust.clone(),
            Arc::new(database.clone()),
            http.clone(),
            discovery.clone(),
            clock,
            config.handshake_config(),
        );
        let trusted_servers =
            TrustedServers::new(trust.clone(), scheduler.clone()).with_dispatcher(dispatcher.clone());

        let mounts = MountRegistry::new();
        let feedback = Feedback::new(Arc::new(OcmNotifier::new(http.clone())), discovery, http);
        let ledger = ShareLedger::new(
            Arc::new(database.clone()),
            trust,
            Arc::new(mounts.clone()),
            feedback,
            config.ledger_config(),
        );

        Self {
            database,
            scheduler,
            trusted_servers,
            ledger,
            groups: Arc::new(StaticGroups::new(config.groups.clone())),
            mounts,
            dispatcher,
            federation_enabled: config.federation_enabled,
        }
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn scheduler(&self) -> &HandshakeScheduler {
        &self.scheduler
    }

    pub fn trusted_servers(&self) -> &TrustedServers {
        &self.trusted_servers
    }

    pub fn ledger(&self) -> &ShareLedger {
        &self.ledger
    }

    pub fn mounts(&self) -> &MountRegistry {
        &self.mounts
    }

    pub fn dispatcher(&self) -> &HandshakeDispatcher {
        &self.dispatcher
    }

    pub fn federation_enabled(&self) -> bool {
        self.federation_enabled
    }

    /// The acting user together with the groups they belong to
    pub async fn principal(&self, user: &str) -> Principal {
        Principal::resolve(user, self.groups.as_ref()).await
    }
}

impl AsRef<Database> for State {
    fn as_ref(&self) -> &Database {
        self.database()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("Database path does not exist")]
    DatabasePathDoesNotExist,
    #[error("Database setup error")]
    DatabaseSetupError(#[from] DatabaseSetupError),
    #[error("Invalid database URL")]
    InvalidDatabaseUrl,
    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    use common::handshake::HandshakeDispatcher;
    use common::ports::{HttpResponse, ManualClock};
    use common::share::{NewShare, ShareStore, ShareType};

    use crate::http_server::test_support::{test_config, CannedHttp};

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_group_accepts_on_sqlite() {
        let temp = tempfile::tempdir().unwrap();
        let url = Url::parse(&format!("sqlite://{}", temp.path().join("db.sqlite").display()))
            .unwrap();
        let database = Database::connect(&url).await.unwrap();

        let http = Arc::new(CannedHttp::unreachable());
        *http.answer.lock() = Ok(HttpResponse::new(
            200,
            r#"{"ocs":{"meta":{"statuscode":200}}}"#,
        ));
        let (dispatcher, _receiver) = HandshakeDispatcher::new();
        let state = State::new(
            &test_config(),
            database.clone(),
            http,
            Arc::new(ManualClock::default()),
            dispatcher,
        );

        let template = state
            .ledger()
            .add_share(NewShare {
                remote: "https://b.example".to_string(),
                token: "token-data".to_string(),
                password: None,
                name: "Data".to_string(),
                owner: "bob".to_string(),
                share_type: ShareType::Group,
                accepted: false,
                recipient: "research-group".to_string(),
                remote_id: "17".to_string(),
                parent_id: None,
            })
            .await
            .unwrap();
        let alice = state.principal("alice").await;

        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let state = state.clone();
                let alice = alice.clone();
                tokio::spawn(async move { state.ledger().accept_share(&alice, template.id).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let rows = database.list_by_recipient("alice").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].parent_id, Some(template.id));
        assert_eq!(rows[0].mount_point, "/Data");
    }
}
