//! The fedshare daemon.
//!
//! Wires the domain core from `common` to real infrastructure:
//! - Database (SQLite stores for trusted hosts, the handshake retry queue and shares)
//! - Outbound HTTP (reqwest), endpoint discovery and OCM notifications
//! - HTTP server (local management API, inbound federation endpoint, health)
//! - Handshake driver (background sweeps of the retry queue)

pub mod config;
pub mod database;
pub mod discovery;
pub mod handshake_driver;
pub mod http_client;
pub mod http_server;
pub mod mounts;
pub mod notifier;
mod process;
pub mod state;

// Re-export key types for convenience
pub use config::Config;
pub use config::Config as ServiceConfig;
pub use database::{Database, DatabaseSetupError};
pub use process::{spawn_service, start_service, ShutdownHandle};
pub use state::{State as ServiceState, StateSetupError};
