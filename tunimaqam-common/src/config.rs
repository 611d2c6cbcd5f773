//! Configuration loading and root folder resolution
//!
//! Every setting resolves in this priority order:
//! 1. Command-line argument (clap also maps its `env` fallbacks here)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the root folder
pub const ROOT_FOLDER_ENV: &str = "TUNIMAQAM_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "tunimaqam.db";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5780;
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
    /// Shared token secret; 0 disables authorization
    pub auth_secret: Option<i64>,
    pub token_ttl_secs: Option<i64>,
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub root_folder: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
    pub auth_secret: Option<i64>,
    pub token_ttl_secs: Option<i64>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub root_folder: PathBuf,
    pub host: String,
    pub port: u16,
    pub log_level: String,
    /// `None` when nothing sets it; the secret stored in the database applies
    pub auth_secret: Option<i64>,
    pub token_ttl_secs: i64,
}

impl ServiceConfig {
    /// Merge command line, environment, TOML and compiled defaults
    pub fn resolve(cli: CliOverrides, toml: TomlConfig) -> Self {
        let root_folder = resolve_root_folder(cli.root_folder.as_deref(), ROOT_FOLDER_ENV, &toml);

        Self {
            root_folder,
            host: cli.host.or(toml.host).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: cli.port.or(toml.port).unwrap_or(DEFAULT_PORT),
            log_level: cli
                .log_level
                .or(toml.log_level)
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            auth_secret: cli.auth_secret.or(toml.auth_secret),
            token_ttl_secs: cli
                .token_ttl_secs
                .or(toml.token_ttl_secs)
                .unwrap_or(DEFAULT_TOKEN_TTL_SECS),
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Root folder: CLI argument, then environment variable, then TOML, then OS default
pub fn resolve_root_folder(cli_arg: Option<&Path>, env_var_name: &str, toml: &TomlConfig) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = &toml.root_folder {
        return path.clone();
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("tunimaqam"))
        .unwrap_or_else(|| PathBuf::from("./tunimaqam_data"))
}

/// Default config file location (`<config_dir>/tunimaqam/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tunimaqam").join("config.toml"))
}

/// Load the TOML config file
///
/// Uses `path` when given, else the default location. A missing file logs a
/// warning and yields defaults; a file that does not parse is an error.
pub fn load_toml_config(path: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = path.map(Path::to_path_buf).or_else(default_config_path) else {
        warn!("Could not determine config directory, using defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!("Config file not found: {} (using defaults)", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(&path)?;
    let config = toml::from_str::<TomlConfig>(&content)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    info!("Loaded config file: {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_nothing_given() {
        let toml = TomlConfig {
            root_folder: Some(PathBuf::from("/srv/tunimaqam")),
            ..Default::default()
        };
        let config = ServiceConfig::resolve(CliOverrides::default(), toml);
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.auth_secret, None);
        assert_eq!(config.token_ttl_secs, 3600);
    }

    #[test]
    fn test_cli_beats_toml() {
        let toml = TomlConfig {
            port: Some(6000),
            host: Some("0.0.0.0".to_string()),
            auth_secret: Some(42),
            ..Default::default()
        };
        let cli = CliOverrides {
            root_folder: Some(PathBuf::from("/tmp/cli-root")),
            port: Some(7000),
            ..Default::default()
        };
        let config = ServiceConfig::resolve(cli, toml);
        assert_eq!(config.port, 7000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.auth_secret, Some(42));
        assert_eq!(config.bind_address(), "0.0.0.0:7000");
        assert_eq!(config.database_path(), PathBuf::from("/tmp/cli-root/tunimaqam.db"));
    }
}
