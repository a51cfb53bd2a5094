//! Server configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/taskboard/config.toml)
//! 3. Environment variables (TASKBOARD_* prefix)
//!
//! Environment variables take precedence over config file values.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable prefix
const ENV_PREFIX: &str = "TASKBOARD";

/// Title given to the board when it is created on first fetch
pub const DEFAULT_BOARD_TITLE: &str = "My First Board";

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory for data storage (SQLite db)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Explicit database path; defaults to `<data_dir>/taskboard.db`
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Address the HTTP API listens on
    #[serde(default = "default_http_addr")]
    pub http_addr: SocketAddr,

    /// Address the realtime WebSocket gateway listens on
    #[serde(default = "default_ws_addr")]
    pub ws_addr: SocketAddr,

    /// Identifier of the single board served by this process
    #[serde(default = "default_board_id")]
    pub board_id: i64,

    /// Title used when the board is created lazily
    #[serde(default = "default_board_title")]
    pub default_board_title: String,

    /// Origins allowed by CORS
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            database_path: None,
            http_addr: default_http_addr(),
            ws_addr: default_ws_addr(),
            board_id: default_board_id(),
            default_board_title: default_board_title(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (TASKBOARD_DATA_DIR, TASKBOARD_HTTP_ADDR, ...)
    /// 2. Config file (~/.config/taskboard/config.toml or TASKBOARD_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        // Empty string falls back to the data_dir default
        if let Ok(val) = std::env::var(format!("{}_DATABASE_PATH", ENV_PREFIX)) {
            self.database_path = if val.is_empty() {
                None
            } else {
                Some(PathBuf::from(val))
            };
        }

        if let Ok(val) = std::env::var(format!("{}_HTTP_ADDR", ENV_PREFIX)) {
            self.http_addr = val
                .parse()
                .with_context(|| format!("Invalid {}_HTTP_ADDR: {}", ENV_PREFIX, val))?;
        }

        if let Ok(val) = std::env::var(format!("{}_WS_ADDR", ENV_PREFIX)) {
            self.ws_addr = val
                .parse()
                .with_context(|| format!("Invalid {}_WS_ADDR: {}", ENV_PREFIX, val))?;
        }

        if let Ok(val) = std::env::var(format!("{}_BOARD_ID", ENV_PREFIX)) {
            self.board_id = val
                .parse()
                .with_context(|| format!("Invalid {}_BOARD_ID: {}", ENV_PREFIX, val))?;
        }

        // Comma separated
        if let Ok(val) = std::env::var(format!("{}_ALLOWED_ORIGINS", ENV_PREFIX)) {
            self.allowed_origins = val
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }

        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with TASKBOARD_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("taskboard")
            .join("config.toml")
    }

    /// Get the path to the SQLite database
    pub fn sqlite_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("taskboard.db"))
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taskboard")
}

fn default_http_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8000))
}

fn default_ws_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8001))
}

fn default_board_id() -> i64 {
    1
}

fn default_board_title() -> String {
    DEFAULT_BOARD_TITLE.to_string()
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &[
        "TASKBOARD_DATA_DIR",
        "TASKBOARD_DATABASE_PATH",
        "TASKBOARD_HTTP_ADDR",
        "TASKBOARD_WS_ADDR",
        "TASKBOARD_BOARD_ID",
        "TASKBOARD_ALLOWED_ORIGINS",
    ];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.board_id, 1);
        assert_eq!(config.default_board_title, "My First Board");
        assert_eq!(config.http_addr.port(), 8000);
        assert_eq!(config.ws_addr.port(), 8001);
        assert_eq!(config.allowed_origins, vec!["http://localhost:3000"]);
        assert!(config.data_dir.ends_with("taskboard"));
    }

    #[test]
    fn test_sqlite_path() {
        let mut config = Config::default();
        assert!(config.sqlite_path().ends_with("taskboard.db"));

        config.database_path = Some(PathBuf::from("/srv/board.db"));
        assert_eq!(config.sqlite_path(), PathBuf::from("/srv/board.db"));
    }

    #[test]
    fn test_env_override_addresses() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("TASKBOARD_HTTP_ADDR", "0.0.0.0:9000");
        env::set_var("TASKBOARD_WS_ADDR", "0.0.0.0:9001");
        config.apply_env_overrides().unwrap();

        assert_eq!(config.http_addr, "0.0.0.0:9000".parse().unwrap());
        assert_eq!(config.ws_addr, "0.0.0.0:9001".parse().unwrap());
    }

    #[test]
    fn test_env_override_invalid_addr() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("TASKBOARD_HTTP_ADDR", "not-an-address");
        let err = config.apply_env_overrides().unwrap_err();
        assert!(err.to_string().contains("TASKBOARD_HTTP_ADDR"));
    }

    #[test]
    fn test_env_override_board_and_origins() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("TASKBOARD_BOARD_ID", "42");
        env::set_var(
            "TASKBOARD_ALLOWED_ORIGINS",
            "http://a.example, http://b.example,",
        );
        config.apply_env_overrides().unwrap();

        assert_eq!(config.board_id, 42);
        assert_eq!(
            config.allowed_origins,
            vec!["http://a.example", "http://b.example"]
        );
    }

    #[test]
    fn test_env_override_database_path() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("TASKBOARD_DATABASE_PATH", "/tmp/tb.db");
        config.apply_env_overrides().unwrap();
        assert_eq!(config.sqlite_path(), PathBuf::from("/tmp/tb.db"));

        // Empty string clears it
        env::set_var("TASKBOARD_DATABASE_PATH", "");
        config.apply_env_overrides().unwrap();
        assert!(config.database_path.is_none());
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            data_dir = "/custom/data"
            http_addr = "127.0.0.1:3100"
            board_id = 7
            default_board_title = "Team"
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/custom/data"));
        assert_eq!(config.http_addr.port(), 3100);
        assert_eq!(config.board_id, 7);
        assert_eq!(config.default_board_title, "Team");
        // Unspecified fields keep their defaults
        assert_eq!(config.ws_addr.port(), 8001);
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);

        let path = PathBuf::from("/nonexistent/config.toml");
        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.board_id, 1);
    }
}
