pub use clap::Parser;

use std::path::PathBuf;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "fedshare")]
#[command(about = "Trusted servers and federated shares between cloud instances")]
pub struct Args {
    /// API of the local daemon (defaults to the port in config.toml)
    #[arg(long, global = true)]
    pub remote: Option<Url>,

    /// Path to the fedshare config directory (defaults to ~/.fedshare)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: crate::Command,
}
