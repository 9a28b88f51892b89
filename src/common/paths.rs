//! Configuration file location
//!
//! Uses the directories crate for platform-appropriate locations:
//! - Linux: `~/.config/cli-e2e/`
//! - macOS: `~/Library/Application Support/cli-e2e/`
//! - Windows: `%APPDATA%\cli-e2e\`

use std::path::PathBuf;

/// Name used for the harness directories
const APP_NAME: &str = "cli-e2e";

/// Environment variable overriding the config file path
pub const CONFIG_ENV: &str = "CLI_E2E_CONFIG";

/// Get the configuration directory path
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
///
/// `CLI_E2E_CONFIG` wins over the platform default.
pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    config_dir().map(|dir| dir.join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_dir_is_valid() {
        let dir = config_dir();
        assert!(dir.is_some());
    }

    #[test]
    fn test_config_path_is_toml() {
        if std::env::var_os(CONFIG_ENV).is_none() {
            let path = config_path().unwrap();
            assert_eq!(path.file_name().unwrap(), "config.toml");
        }
    }
}
