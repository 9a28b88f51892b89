//! Background API server process
//!
//! `ServerProcess` owns the child started with `serve`. Killing consumes
//! the handle, so a server can only be killed once; a handle dropped
//! without an explicit kill takes the child down with it.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command as TokioCommand};

use crate::common::{Error, Result};

use super::platform::Endpoint;
use super::wait::wait_for;

/// A running `serve` process
#[derive(Debug)]
pub struct ServerProcess {
    child: Child,
    address: String,
}

impl ServerProcess {
    /// Start `<cli> --config <config_dir> serve --address <address>`
    pub fn serve(cli: &Path, config_dir: &Path, address: &str) -> Result<Self> {
        tracing::info!(cli = %cli.display(), address, "Starting API server");
        let child = TokioCommand::new(cli)
            .arg("--config")
            .arg(config_dir)
            .arg("serve")
            .arg("--address")
            .arg(address)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::process_spawn(&cli.display().to_string(), e))?;

        Ok(Self {
            child,
            address: address.to_string(),
        })
    }

    /// OS process id, `None` once the process has been reaped
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    /// Address the server was asked to listen on
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Whether the process has not exited yet
    pub fn is_running(&mut self) -> Result<bool> {
        Ok(self.child.try_wait()?.is_none())
    }

    /// Wait until the server accepts connections on its address
    ///
    /// Fails early if the process exits while we are waiting.
    pub async fn wait_ready(&mut self, tick: Duration, timeout: Duration) -> Result<()> {
        let endpoint = Endpoint::parse(&self.address)?;
        let mut exited = None;
        let child = &mut self.child;

        wait_for(tick, timeout, None, || {
            if exited.is_none() {
                if let Ok(Some(status)) = child.try_wait() {
                    exited = Some(status);
                }
            }
            let gone = exited.is_some();
            let endpoint = endpoint.clone();
            async move { gone || endpoint.is_ready().await }
        })
        .await?;

        match exited {
            Some(status) => Err(Error::command_failed(
                &format!("serve --address {}", self.address),
                status.code(),
                "server exited before accepting connections",
            )),
            None => Ok(()),
        }
    }

    /// Force-terminate the server and reap it
    ///
    /// A server that has already exited counts as killed.
    pub async fn kill(mut self) -> Result<()> {
        if let Some(status) = self.child.try_wait()? {
            tracing::info!(code = ?status.code(), "API server already exited");
            return Ok(());
        }
        tracing::info!(pid = ?self.pid(), "Killing API server");
        self.child.kill().await?;
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    /// Stand-in CLI that runs `body` whatever its arguments
    fn fake_cli(dir: &Path, body: &str) -> std::path::PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("fake-cli");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[tokio::test]
    async fn test_serve_then_kill() {
        let dir = tempfile::tempdir().unwrap();
        let cli = fake_cli(dir.path(), "sleep 30");
        let mut server = ServerProcess::serve(&cli, dir.path(), "unix:///tmp/x.sock").unwrap();
        assert!(server.pid().is_some());
        assert!(server.is_running().unwrap());
        assert_eq!(server.address(), "unix:///tmp/x.sock");
        server.kill().await.unwrap();
    }

    #[tokio::test]
    async fn test_wait_ready_fails_when_server_exits() {
        let dir = tempfile::tempdir().unwrap();
        let cli = fake_cli(dir.path(), "exit 2");
        let address = format!("unix://{}", dir.path().join("never.sock").display());
        let mut server = ServerProcess::serve(&cli, dir.path(), &address).unwrap();
        let err = server
            .wait_ready(Duration::from_millis(50), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CommandFailed { code: Some(2), .. }));
    }

    #[tokio::test]
    async fn test_kill_after_server_exited_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let cli = fake_cli(dir.path(), "exit 0");
        let address = format!("unix://{}", dir.path().join("never.sock").display());
        let mut server = ServerProcess::serve(&cli, dir.path(), &address).unwrap();
        let err = server
            .wait_ready(Duration::from_millis(50), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CommandFailed { code: Some(0), .. }));
        assert!(!server.is_running().unwrap());
        server.kill().await.unwrap();
    }

    #[tokio::test]
    async fn test_wait_ready_times_out_without_listener() {
        let dir = tempfile::tempdir().unwrap();
        let cli = fake_cli(dir.path(), "sleep 30");
        let address = format!("unix://{}", dir.path().join("never.sock").display());
        let mut server = ServerProcess::serve(&cli, dir.path(), &address).unwrap();
        let err = server
            .wait_ready(Duration::from_millis(50), Duration::from_millis(300))
            .await
            .unwrap_err();
        assert!(err.is_wait_timeout());
        server.kill().await.unwrap();
    }
}
