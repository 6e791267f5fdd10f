use std::collections::HashMap;
use std::{fs, path::PathBuf};

use serde::{Deserialize, Serialize};

use common::share::DEFAULT_SHARE_FOLDER;
use service::config::DEFAULT_API_PORT;

pub const APP_NAME: &str = "fedshare";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DB_FILE_NAME: &str = "db.sqlite";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Port for the daemon's HTTP server (local API and federation endpoints)
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    /// Public base URL remotes use to reach this instance.
    ///  Defaults to http://localhost:<api_port>
    #[serde(default)]
    pub self_origin: Option<String>,
    /// Folder accepted shares are mounted under
    #[serde(default = "default_share_folder")]
    pub share_folder: String,
    /// Run trust handshakes and accept inbound shares
    #[serde(default = "default_true")]
    pub federation_enabled: bool,
    /// Accept user shares from trusted servers without asking
    #[serde(default)]
    pub auto_accept_trusted: bool,
    /// Group name -> member user ids
    #[serde(default)]
    pub groups: HashMap<String, Vec<String>>,
}

fn default_api_port() -> u16 {
    DEFAULT_API_PORT
}

fn default_share_folder() -> String {
    DEFAULT_SHARE_FOLDER.to_string()
}

fn default_true() -> bool {
    true
}

impl AppConfig {
    pub fn self_origin(&self) -> String {
        self.self_origin
            .clone()
            .unwrap_or_else(|| format!("http://localhost:{}", self.api_port))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            self_origin: None,
            share_folder: default_share_folder(),
            federation_enabled: true,
            auto_accept_trusted: false,
            groups: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the fedshare directory (~/.fedshare)
    pub fedshare_dir: PathBuf,
    /// Path to the SQLite database
    pub db_path: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the fedshare directory path (custom or default ~/.fedshare)
    pub fn fedshare_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new fedshare state directory
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let fedshare_dir = Self::fedshare_dir(custom_path)?;

        if fedshare_dir.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&fedshare_dir)?;

        let config = config.unwrap_or_default();
        let config_path = fedshare_dir.join(CONFIG_FILE_NAME);
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        // Create empty database (just touch the file, it will be migrated by the daemon)
        let db_path = fedshare_dir.join(DB_FILE_NAME);
        fs::write(&db_path, "")?;

        Ok(Self {
            fedshare_dir,
            db_path,
            config_path,
            config,
        })
    }

    /// Load existing state from the fedshare directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let fedshare_dir = Self::fedshare_dir(custom_path)?;

        if !fedshare_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let db_path = fedshare_dir.join(DB_FILE_NAME);
        let config_path = fedshare_dir.join(CONFIG_FILE_NAME);

        if !db_path.exists() {
            return Err(StateError::MissingFile(DB_FILE_NAME.to_string()));
        }
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        Ok(Self {
            fedshare_dir,
            db_path,
            config_path,
            config,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("fedshare directory not initialized. Run 'fedshare init' first")]
    NotInitialized,

    #[error("fedshare directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_then_load() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("state");

        let mut config = AppConfig {
            api_port: 4000,
            self_origin: Some("https://cloud.example".to_string()),
            ..AppConfig::default()
        };
        config
            .groups
            .insert("staff".to_string(), vec!["alice".to_string()]);

        let created = AppState::init(Some(dir.clone()), Some(config)).unwrap();
        assert!(created.db_path.exists());
        assert!(created.config_path.exists());

        let loaded = AppState::load(Some(dir)).unwrap();
        assert_eq!(loaded.config.api_port, 4000);
        assert_eq!(loaded.config.self_origin(), "https://cloud.example");
        assert_eq!(loaded.config.groups["staff"], vec!["alice".to_string()]);
        assert!(loaded.config.federation_enabled);
    }

    #[test]
    fn test_init_twice_fails() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("state");

        AppState::init(Some(dir.clone()), None).unwrap();
        assert!(matches!(
            AppState::init(Some(dir), None),
            Err(StateError::AlreadyInitialized)
        ));
    }

    #[test]
    fn test_load_missing_dir() {
        let temp = tempfile::tempdir().unwrap();
        assert!(matches!(
            AppState::load(Some(temp.path().join("absent"))),
            Err(StateError::NotInitialized)
        ));
    }

    #[test]
    fn test_sparse_config_uses_defaults() {
        let config: AppConfig = toml::from_str("api_port = 8123\n").unwrap();
        assert_eq!(config.share_folder, "/");
        assert!(config.federation_enabled);
        assert!(!config.auto_accept_trusted);
        assert_eq!(config.self_origin(), "http://localhost:8123");
    }
}
