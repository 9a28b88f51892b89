//! Configuration file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::paths::config_path;
use super::Result;

/// Environment variable overriding the CLI binary path
pub const CLI_BIN_ENV: &str = "CLI_E2E_BIN";

/// Main configuration structure
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// CLI under test
    #[serde(default)]
    pub cli: CliConfig,

    /// Node client settings
    #[serde(default)]
    pub node: NodeConfig,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,
}

/// The CLI binary under test
#[derive(Debug, Deserialize, Clone)]
pub struct CliConfig {
    /// Path to the CLI executable
    #[serde(default = "default_cli_path")]
    pub path: PathBuf,

    /// Process name of the legacy helper spawned for builds
    #[serde(default = "default_legacy_helper")]
    pub legacy_helper: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            path: default_cli_path(),
            legacy_helper: default_legacy_helper(),
        }
    }
}

fn default_cli_path() -> PathBuf {
    PathBuf::from("../../bin/docker")
}

fn default_legacy_helper() -> String {
    "docker-classic".to_string()
}

/// Node client settings
#[derive(Debug, Deserialize, Clone)]
pub struct NodeConfig {
    /// Directory holding the Node API client
    #[serde(default = "default_client_dir")]
    pub client_dir: PathBuf,

    /// Package manager used to install and start the client
    #[serde(default = "default_package_manager")]
    pub package_manager: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            client_dir: default_client_dir(),
            package_manager: default_package_manager(),
        }
    }
}

fn default_client_dir() -> PathBuf {
    PathBuf::from("../node-client")
}

fn default_package_manager() -> String {
    "yarn".to_string()
}

/// Timeout settings
#[derive(Debug, Deserialize, Clone)]
pub struct Timeouts {
    /// Poll interval for process-list waits
    #[serde(default = "default_poll_tick")]
    pub poll_tick_ms: u64,

    /// How long the legacy helper may take to appear
    #[serde(default = "default_helper_start")]
    pub helper_start_secs: u64,

    /// How long the legacy helper may take to die after cancel
    #[serde(default = "default_helper_stop")]
    pub helper_stop_secs: u64,

    /// How long the API server may take to accept connections
    #[serde(default = "default_server_ready")]
    pub server_ready_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            poll_tick_ms: default_poll_tick(),
            helper_start_secs: default_helper_start(),
            helper_stop_secs: default_helper_stop(),
            server_ready_secs: default_server_ready(),
        }
    }
}

fn default_poll_tick() -> u64 {
    1000
}
fn default_helper_start() -> u64 {
    10
}
fn default_helper_stop() -> u64 {
    12
}
fn default_server_ready() -> u64 {
    10
}

impl Timeouts {
    pub fn poll_tick(&self) -> Duration {
        Duration::from_millis(self.poll_tick_ms)
    }

    pub fn helper_start(&self) -> Duration {
        Duration::from_secs(self.helper_start_secs)
    }

    pub fn helper_stop(&self) -> Duration {
        Duration::from_secs(self.helper_stop_secs)
    }

    pub fn server_ready(&self) -> Duration {
        Duration::from_secs(self.server_ready_secs)
    }
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        let mut config = match config_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Load configuration from an explicit file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| super::Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }

    /// Apply environment overrides
    pub fn apply_env(&mut self) {
        if let Some(bin) = std::env::var_os(CLI_BIN_ENV).filter(|b| !b.is_empty()) {
            self.cli.path = PathBuf::from(bin);
        }
    }

    /// Locate the package manager for the Node client
    ///
    /// Returns `None` when it is not installed or `SKIP_NODE` is set.
    pub fn node_package_manager(&self) -> Option<PathBuf> {
        if skip_node() {
            return None;
        }
        which::which(&self.node.package_manager).ok()
    }
}

/// Whether `SKIP_NODE` asks to skip Node-client scenarios
pub fn skip_node() -> bool {
    std::env::var_os("SKIP_NODE").is_some_and(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.cli.path, PathBuf::from("../../bin/docker"));
        assert_eq!(config.cli.legacy_helper, "docker-classic");
        assert_eq!(config.node.package_manager, "yarn");
        assert_eq!(config.timeouts.poll_tick(), Duration::from_secs(1));
        assert_eq!(config.timeouts.helper_start(), Duration::from_secs(10));
        assert_eq!(config.timeouts.helper_stop(), Duration::from_secs(12));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::parse(
            r#"
[cli]
path = "/usr/local/bin/docker"

[timeouts]
poll_tick_ms = 250
"#,
        )
        .unwrap();
        assert_eq!(config.cli.path, PathBuf::from("/usr/local/bin/docker"));
        assert_eq!(config.cli.legacy_helper, "docker-classic");
        assert_eq!(config.timeouts.poll_tick(), Duration::from_millis(250));
        assert_eq!(config.timeouts.helper_stop_secs, 12);
    }

    #[test]
    fn test_invalid_file_is_parse_error() {
        let err = Config::parse("[cli\npath = 3").unwrap_err();
        assert!(matches!(err, crate::Error::ConfigParse(_)));
    }
}
