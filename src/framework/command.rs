//! External command execution
//!
//! Builds and runs a child process, capturing its output. A command may be
//! bounded by a deadline or by a shutdown signal; either one stops the
//! child before `exec` returns.
//!
//! Unix: the child first gets SIGINT so it can tear down its own children,
//! and is killed only if it is still alive after a grace period.
//! Windows: the child is killed outright.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command as TokioCommand};
use tokio::sync::oneshot;

use crate::common::{Error, Result};

/// Time a child gets to exit on its own after being interrupted
const INTERRUPT_GRACE: Duration = Duration::from_secs(5);

/// Output captured from a finished command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: ExitStatus,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }
}

/// Builder for a single command invocation
#[derive(Debug)]
pub struct CliCommand {
    program: PathBuf,
    args: Vec<OsString>,
    envs: Vec<(OsString, OsString)>,
    dir: Option<PathBuf>,
    timeout: Option<Duration>,
    shutdown: Option<oneshot::Receiver<()>>,
    grace: Duration,
}

impl CliCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
            dir: None,
            timeout: None,
            shutdown: None,
            grace: INTERRUPT_GRACE,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Run the command from `dir`
    pub fn within_directory(mut self, dir: impl AsRef<Path>) -> Self {
        self.dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Stop the command if it runs longer than `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Stop the command when `shutdown` fires or its sender is dropped
    pub fn with_shutdown(mut self, shutdown: oneshot::Receiver<()>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// How long an interrupted command may take to exit before it is killed
    pub fn with_grace_period(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Human-readable command line, for logs and errors
    pub fn display(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }

    fn spawn(&self) -> Result<Child> {
        let mut cmd = TokioCommand::new(&self.program);
        cmd.args(&self.args)
            .envs(self.envs.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.dir {
            cmd.current_dir(dir);
        }
        cmd.spawn()
            .map_err(|e| Error::process_spawn(&self.program.display().to_string(), e))
    }

    /// Run to completion and return the captured output, whatever the exit code
    pub async fn output(self) -> Result<CommandOutput> {
        let line = self.display();
        tracing::debug!(command = %line, dir = ?self.dir, "Running command");

        let mut child = self.spawn()?;
        let stdout = tokio::spawn(read_all(child.stdout.take()));
        let stderr = tokio::spawn(read_all(child.stderr.take()));

        let status = wait_child(&mut child, &line, self.timeout, self.shutdown, self.grace).await?;

        let stdout = stdout
            .await
            .map_err(|e| Error::Internal(format!("stdout reader failed: {e}")))??;
        let stderr = stderr
            .await
            .map_err(|e| Error::Internal(format!("stderr reader failed: {e}")))??;

        tracing::debug!(command = %line, code = ?status.code(), "Command finished");
        Ok(CommandOutput {
            stdout,
            stderr,
            status,
        })
    }

    /// Run to completion and return stdout, failing on a non-zero exit
    pub async fn exec(self) -> Result<String> {
        let line = self.display();
        let output = self.output().await?;
        if !output.success() {
            return Err(Error::command_failed(&line, output.code(), &output.stderr));
        }
        Ok(output.stdout)
    }
}

async fn wait_child(
    child: &mut Child,
    line: &str,
    timeout: Option<Duration>,
    shutdown: Option<oneshot::Receiver<()>>,
    grace: Duration,
) -> Result<ExitStatus> {
    let deadline = async {
        match timeout {
            Some(t) => tokio::time::sleep(t).await,
            None => std::future::pending().await,
        }
    };
    let cancelled = async {
        match shutdown {
            // A dropped sender means the same as an explicit signal
            Some(rx) => {
                let _ = rx.await;
            }
            None => std::future::pending().await,
        }
    };

    tokio::select! {
        status = child.wait() => Ok(status?),
        _ = deadline => {
            tracing::debug!(command = %line, "Command deadline reached, stopping");
            stop(child, line, grace).await?;
            Err(Error::Timeout {
                command: line.to_string(),
                timeout: timeout.unwrap_or_default(),
            })
        }
        _ = cancelled => {
            tracing::debug!(command = %line, "Shutdown requested, stopping");
            stop(child, line, grace).await?;
            Err(Error::Cancelled {
                command: line.to_string(),
            })
        }
    }
}

/// Interrupt the child, then kill it if it outlives `grace`
async fn stop(child: &mut Child, line: &str, grace: Duration) -> Result<()> {
    if interrupt(child, grace).await? {
        return Ok(());
    }
    tracing::debug!(command = %line, ?grace, "Command still running, killing");
    child.kill().await?;
    Ok(())
}

/// Send SIGINT and wait up to `grace` for the child to exit
///
/// Returns whether the child exited.
#[cfg(unix)]
async fn interrupt(child: &mut Child, grace: Duration) -> Result<bool> {
    let Some(pid) = child.id() else {
        // Already reaped
        return Ok(true);
    };
    // SAFETY: pid is our own unreaped child, so it cannot have been recycled
    let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGINT) };
    if rc != 0 {
        return Ok(false);
    }
    match tokio::time::timeout(grace, child.wait()).await {
        Ok(status) => {
            status?;
            Ok(true)
        }
        Err(_) => Ok(false),
    }
}

#[cfg(not(unix))]
async fn interrupt(_child: &mut Child, _grace: Duration) -> Result<bool> {
    Ok(false)
}

async fn read_all<R: AsyncRead + Unpin>(reader: Option<R>) -> Result<String> {
    let mut buf = Vec::new();
    if let Some(mut reader) = reader {
        reader.read_to_end(&mut buf).await?;
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Command listing the processes of the current user
///
/// `-w -w` keeps `ps` from truncating long command lines when piped.
pub fn list_processes_command() -> CliCommand {
    if cfg!(windows) {
        CliCommand::new("tasklist")
    } else {
        CliCommand::new("ps").args(["-x", "-w", "-w"])
    }
}
