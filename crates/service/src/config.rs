use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use common::handshake::{HandshakeConfig, DEFAULT_BASE_INTERVAL, DEFAULT_MAX_RETRIES};
use common::share::{LedgerConfig, DEFAULT_SHARE_FOLDER};

use crate::discovery::DEFAULT_DISCOVERY_TTL;

pub const DEFAULT_API_PORT: u16 = 3000;
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct Config {
    // http server configuration
    /// address for the API server to listen on.
    ///  if not set then 0.0.0.0:3000 will be used
    pub listen_addr: SocketAddr,

    // data store configuration
    /// a path to a sqlite database, if not set then an
    ///  in-memory database will be used
    pub sqlite_path: Option<PathBuf>,

    // federation
    /// public base URL of this instance, handed to remotes so they can
    ///  call back
    pub self_origin: String,
    /// master switch for the trust handshake
    pub federation_enabled: bool,
    /// wait after the first failed handshake attempt
    pub handshake_base_interval: Duration,
    /// attempts after which a handshake is abandoned
    pub handshake_max_retries: u32,
    /// how often the background driver sweeps the retry queue
    pub handshake_sweep_interval: Duration,
    /// how long a remote's advertised endpoints are trusted
    pub discovery_ttl: Duration,

    // shares
    /// folder accepted shares are mounted under
    pub share_folder: String,
    /// accept user shares from trusted servers without asking
    pub auto_accept_trusted: bool,
    /// group -> members, stands in for the user management layer
    pub groups: HashMap<String, Vec<String>>,

    // misc
    pub log_level: tracing::Level,
    /// directory for daily rolling log files, stdout only if not set
    pub log_dir: Option<PathBuf>,
}

impl Config {
    pub fn handshake_config(&self) -> HandshakeConfig {
        let mut config = HandshakeConfig::new(&self.self_origin);
        config.enabled = self.federation_enabled;
        config.base_interval = self.handshake_base_interval;
        config.max_retries = self.handshake_max_retries;
        config
    }

    pub fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            share_folder: self.share_folder.clone(),
            auto_accept_trusted: self.auto_accept_trusted,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), DEFAULT_API_PORT),
            sqlite_path: None,
            self_origin: format!("http://localhost:{}", DEFAULT_API_PORT),
            federation_enabled: true,
            handshake_base_interval: DEFAULT_BASE_INTERVAL,
            handshake_max_retries: DEFAULT_MAX_RETRIES,
            handshake_sweep_interval: DEFAULT_SWEEP_INTERVAL,
            discovery_ttl: DEFAULT_DISCOVERY_TTL,
            share_folder: DEFAULT_SHARE_FOLDER.to_string(),
            auto_accept_trusted: false,
            groups: HashMap::new(),
            log_level: tracing::Level::INFO,
            log_dir: None,
        }
    }
}
