//! Per-test suite context
//!
//! Each suite owns an isolated configuration directory that every CLI
//! command and server started through it points at with `--config`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::common::{Config, Error, Result};

use super::command::{self, CliCommand};
use super::platform;
use super::server::ServerProcess;

/// Keep the config directory after the suite is dropped when set
const PRESERVE_ENV: &str = "PRESERVE_E2E_ARTIFACTS";

/// Isolated environment for one scenario
#[derive(Debug)]
pub struct Suite {
    name: String,
    config: Config,
    dir: Option<TempDir>,
    config_dir: PathBuf,
}

impl Suite {
    /// Create a suite with a fresh config directory
    pub fn new(name: &str, config: Config) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("cli-e2e-{name}-"))
            .tempdir()?;
        let config_dir = dir.path().to_path_buf();
        tracing::debug!(suite = name, config_dir = %config_dir.display(), "Created suite");

        Ok(Self {
            name: name.to_string(),
            config,
            dir: Some(dir),
            config_dir,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Path of the CLI binary under test
    pub fn cli_path(&self) -> &Path {
        &self.config.cli.path
    }

    /// Command running the CLI under test against this suite's config
    pub fn new_cli_command<I, S>(&self, args: I) -> CliCommand
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        CliCommand::new(self.cli_path())
            .arg("--config")
            .arg(self.config_dir.as_os_str())
            .args(args)
    }

    /// Command running any other program
    pub fn new_command<I, S>(&self, program: impl Into<PathBuf>, args: I) -> CliCommand
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        CliCommand::new(program).args(args)
    }

    /// Command listing running processes
    pub fn list_processes_command(&self) -> CliCommand {
        command::list_processes_command()
    }

    /// `(server, client)` addresses for the API server of this suite
    pub fn server_addresses(&self) -> (String, String) {
        platform::server_addresses(&self.config_dir)
    }

    /// Start the API server on `address`
    pub fn serve_api(&self, address: &str) -> Result<ServerProcess> {
        ServerProcess::serve(self.cli_path(), &self.config_dir, address)
    }

    /// Write a file into the config directory
    pub fn write_file(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.config_dir.join(name);
        std::fs::write(&path, contents).map_err(|e| Error::FileWrite {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Ok(path)
    }
}

fn preserve_artifacts() -> bool {
    std::env::var(PRESERVE_ENV)
        .map(|v| {
            let v = v.to_ascii_lowercase();
            !(v.is_empty() || v == "0" || v == "false" || v == "no")
        })
        .unwrap_or(false)
}

impl Drop for Suite {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            if preserve_artifacts() {
                let kept = dir.keep();
                tracing::info!(suite = %self.name, dir = %kept.display(), "Preserved suite artifacts");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suite_creates_and_removes_config_dir() {
        let suite = Suite::new("create", Config::default()).unwrap();
        let dir = suite.config_dir().to_path_buf();
        assert!(dir.is_dir());
        assert_eq!(suite.name(), "create");
        drop(suite);
        if !preserve_artifacts() {
            assert!(!dir.exists());
        }
    }

    #[test]
    fn test_cli_command_points_at_config_dir() {
        let mut config = Config::default();
        config.cli.path = PathBuf::from("/opt/bin/docker");
        let suite = Suite::new("cmd", config).unwrap();
        let line = suite.new_cli_command(["ps"]).display();
        assert_eq!(
            line,
            format!("/opt/bin/docker --config {} ps", suite.config_dir().display())
        );
    }

    #[test]
    fn test_write_file_lands_in_config_dir() {
        let suite = Suite::new("write", Config::default()).unwrap();
        let path = suite.write_file("Dockerfile", "FROM alpine:3.10\n").unwrap();
        assert_eq!(path.parent().unwrap(), suite.config_dir());
        assert_eq!(std::fs::read_to_string(path).unwrap(), "FROM alpine:3.10\n");
    }
}
