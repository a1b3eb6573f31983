//! Configuration loading and data folder resolution
//!
//! Every setting resolves with the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing or malformed TOML file is never fatal: it is logged and the
//! remaining tiers apply.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default HTTP port for the voting service
pub const DEFAULT_PORT: u16 = 5780;

/// Default bind host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default total budget for retrying a vote while SQLite reports the write lock busy
pub const DEFAULT_LOCK_WAIT_MS: u64 = 5000;

/// Database file name inside the data folder
pub const DATABASE_FILE_NAME: &str = "writein.db";

/// Environment variable overriding the data folder
pub const ENV_DATA_FOLDER: &str = "WRITEIN_DATA_FOLDER";

/// Environment variable overriding the listen port
pub const ENV_PORT: &str = "WRITEIN_PORT";

/// Environment variable pointing at an explicit TOML config file
pub const ENV_CONFIG_FILE: &str = "WRITEIN_CONFIG";

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub data_folder: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub lock_wait_ms: Option<u64>,
    /// Candidates present at election start
    #[serde(default)]
    pub seed_candidates: Vec<String>,
}

impl TomlConfig {
    /// Parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load from an explicit path or the platform default location.
    ///
    /// Falls back to an empty config (all defaults) when nothing usable is found.
    pub fn load_or_default(explicit: Option<&Path>) -> Self {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => std::env::var(ENV_CONFIG_FILE)
                .ok()
                .map(PathBuf::from)
                .or_else(default_config_file),
        };

        let Some(path) = path else {
            debug!("No config file found, using compiled defaults");
            return Self::default();
        };

        match Self::load(&path) {
            Ok(config) => {
                debug!("Loaded config file: {}", path.display());
                config
            }
            Err(e) => {
                warn!("Ignoring config file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub data_folder: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub lock_wait_ms: Option<u64>,
    pub config_file: Option<PathBuf>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub data_folder: PathBuf,
    pub host: String,
    pub port: u16,
    pub lock_wait_ms: u64,
    pub seed_candidates: Vec<String>,
}

impl ServiceConfig {
    /// Resolve every setting from CLI, environment, TOML and defaults
    pub fn resolve(cli: CliOverrides) -> Self {
        let toml = TomlConfig::load_or_default(cli.config_file.as_deref());
        Self::resolve_with(cli, toml)
    }

    /// Resolve against an already-loaded TOML config
    pub fn resolve_with(cli: CliOverrides, toml: TomlConfig) -> Self {
        let data_folder = resolve_data_folder(cli.data_folder, ENV_DATA_FOLDER, toml.data_folder);

        let env_port = std::env::var(ENV_PORT).ok().and_then(|p| match p.parse::<u16>() {
            Ok(port) => Some(port),
            Err(_) => {
                warn!("Ignoring invalid {}={}", ENV_PORT, p);
                None
            }
        });

        Self {
            data_folder,
            host: cli
                .host
                .or(toml.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: cli.port.or(env_port).or(toml.port).unwrap_or(DEFAULT_PORT),
            lock_wait_ms: cli
                .lock_wait_ms
                .or(toml.lock_wait_ms)
                .unwrap_or(DEFAULT_LOCK_WAIT_MS),
            seed_candidates: toml.seed_candidates,
        }
    }

    /// Path of the SQLite database inside the data folder
    pub fn database_path(&self) -> PathBuf {
        self.data_folder.join(DATABASE_FILE_NAME)
    }

    /// `host:port` string for the TCP listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Data folder resolution: CLI, then environment, then TOML, then OS default
pub fn resolve_data_folder(
    cli_arg: Option<PathBuf>,
    env_var_name: &str,
    toml_value: Option<PathBuf>,
) -> PathBuf {
    if let Some(path) = cli_arg {
        return path;
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = toml_value {
        return path;
    }

    default_data_folder()
}

/// Default configuration file path for the platform, if one exists
fn default_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("writein").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/writein/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// OS-dependent default data folder
pub fn default_data_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/writein (or /var/lib/writein for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("writein"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/writein"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("writein"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/writein"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("writein"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\writein"))
    } else {
        PathBuf::from("./writein_data")
    }
}
