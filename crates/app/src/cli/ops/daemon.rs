use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use clap::Args;

use service::{spawn_service, ServiceConfig};

use crate::state::AppState;

#[derive(Args, Debug, Clone)]
pub struct Daemon {
    /// Override API server port (default from config)
    #[arg(long)]
    pub api_port: Option<u16>,

    /// Override the public base URL (default from config)
    #[arg(long)]
    pub self_origin: Option<String>,

    /// Do not run trust handshakes or accept inbound shares
    #[arg(long)]
    pub no_federation: bool,

    /// Seconds between sweeps of the handshake retry queue
    #[arg(long)]
    pub sweep_interval: Option<u64>,

    /// Directory for log files (logs to stdout only if not set)
    #[arg(long)]
    pub log_dir: Option<std::path::PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("state error: {0}")]
    StateError(#[from] crate::state::StateError),

    #[error("daemon failed: {0}")]
    Failed(String),
}

impl Daemon {
    /// Merge the on-disk config with command line overrides
    fn service_config(&self, state: AppState) -> ServiceConfig {
        let defaults = ServiceConfig::default();
        let api_port = self.api_port.unwrap_or(state.config.api_port);
        let self_origin = self
            .self_origin
            .clone()
            .or_else(|| state.config.self_origin.clone())
            .unwrap_or_else(|| format!("http://localhost:{}", api_port));

        ServiceConfig {
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), api_port),
            sqlite_path: Some(state.db_path),
            self_origin,
            federation_enabled: state.config.federation_enabled && !self.no_federation,
            handshake_sweep_interval: self
                .sweep_interval
                .map(Duration::from_secs)
                .unwrap_or(defaults.handshake_sweep_interval),
            share_folder: state.config.share_folder,
            auto_accept_trusted: state.config.auto_accept_trusted,
            groups: state.config.groups,
            log_level: tracing::Level::DEBUG,
            log_dir: self.log_dir.clone(),
            ..defaults
        }
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Daemon {
    type Error = DaemonError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        // Load state from config path (or default ~/.fedshare)
        let state = AppState::load(ctx.config_path.clone())?;
        let config = self.service_config(state);

        spawn_service(&config).await;
        Ok("daemon ended".to_string())
    }
}
