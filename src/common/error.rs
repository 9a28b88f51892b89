//! Error types for the e2e harness
//!
//! Messages are written for a human reading test output: they name the
//! command that failed and carry its stderr where there is one.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the harness
#[derive(Error, Debug)]
pub enum Error {
    // === Process Errors ===
    #[error("Failed to start '{program}': {source}")]
    ProcessSpawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Command '{command}' exited with code {code:?}\nstderr: {stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Command '{command}' was cancelled")]
    Cancelled { command: String },

    #[error("Command '{command}' timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    // === Wait Errors ===
    #[error("Condition not met within {0:?}")]
    WaitTimeout(Duration),

    // === Test Errors ===
    #[error("Test assertion failed: {0}")]
    TestAssertion(String),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    #[error("Failed to write file '{path}': {error}")]
    FileWrite { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a process spawn error for a program
    pub fn process_spawn(program: &str, source: io::Error) -> Self {
        Self::ProcessSpawn {
            program: program.to_string(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: &str, code: Option<i32>, stderr: &str) -> Self {
        Self::CommandFailed {
            command: command.to_string(),
            code,
            stderr: stderr.trim_end().to_string(),
        }
    }

    /// Create a test assertion error
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::TestAssertion(message.into())
    }

    /// Whether this error means "condition never became true"
    pub fn is_wait_timeout(&self) -> bool {
        matches!(self, Error::WaitTimeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_timeout_is_distinct_from_command_timeout() {
        let wait = Error::WaitTimeout(Duration::from_secs(10));
        let cmd = Error::Timeout {
            command: "docker build".to_string(),
            timeout: Duration::from_secs(10),
        };
        assert!(wait.is_wait_timeout());
        assert!(!cmd.is_wait_timeout());
    }

    #[test]
    fn test_sub_second_timeout_keeps_precision() {
        let err = Error::Timeout {
            command: "docker ps".to_string(),
            timeout: Duration::from_millis(250),
        };
        assert_eq!(err.to_string(), "Command 'docker ps' timed out after 250ms");
    }

    #[test]
    fn test_command_failed_trims_stderr() {
        let err = Error::command_failed("docker ps", Some(1), "boom\n\n");
        assert_eq!(
            err.to_string(),
            "Command 'docker ps' exited with code Some(1)\nstderr: boom"
        );
    }
}
