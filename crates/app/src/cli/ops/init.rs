use clap::Args;

use common::share::DEFAULT_SHARE_FOLDER;
use service::config::DEFAULT_API_PORT;

use crate::state::{AppConfig, AppState};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Port for the daemon's HTTP server
    #[arg(long, default_value_t = DEFAULT_API_PORT)]
    pub api_port: u16,

    /// Public base URL remotes use to reach this instance
    #[arg(long)]
    pub self_origin: Option<String>,

    /// Folder accepted shares are mounted under
    #[arg(long, default_value_t = DEFAULT_SHARE_FOLDER.to_string())]
    pub share_folder: String,

    /// Accept user shares from trusted servers without asking
    #[arg(long)]
    pub auto_accept_trusted: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] crate::state::StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let config = AppConfig {
            api_port: self.api_port,
            self_origin: self.self_origin.clone(),
            share_folder: self.share_folder.clone(),
            auto_accept_trusted: self.auto_accept_trusted,
            ..AppConfig::default()
        };

        let state = AppState::init(ctx.config_path.clone(), Some(config))?;

        let output = format!(
            "Initialized fedshare directory at: {}\n\
             - Database: {}\n\
             - Config: {}\n\
             - API port: {}\n\
             - Self origin: {}\n\
             - Share folder: {}",
            state.fedshare_dir.display(),
            state.db_path.display(),
            state.config_path.display(),
            state.config.api_port,
            state.config.self_origin(),
            state.config.share_folder,
        );

        Ok(output)
    }
}
