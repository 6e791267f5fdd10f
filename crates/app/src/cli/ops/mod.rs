pub mod daemon;
pub mod health;
pub mod init;
pub mod shares;
pub mod trust;
pub mod version;

pub use daemon::Daemon;
pub use health::Health;
pub use init::Init;
pub use shares::Shares;
pub use trust::Trust;
pub use version::Version;
