//! Host platform queries and platform-dependent naming
//!
//! Unix/macOS: the API server listens on a Unix domain socket in the
//! suite's config directory.
//! Windows: it listens on the `clibackend` named pipe.

use std::io;
use std::path::{Path, PathBuf};

use interprocess::local_socket::tokio::{prelude::*, Stream};
use interprocess::local_socket::{GenericFilePath, GenericNamespaced};

use crate::common::{Error, Result};

/// Named pipe used by the API server on Windows
const PIPE_NAME: &str = "clibackend";

/// Socket file created in the config directory on other platforms
const SOCKET_FILE: &str = "docker.sock";

/// Host operating system family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    Windows,
    Unix,
}

impl OsFamily {
    /// Family of the executing host
    pub fn current() -> Self {
        if cfg!(windows) {
            OsFamily::Windows
        } else {
            OsFamily::Unix
        }
    }
}

/// Whether the executing host is Windows
pub fn is_windows() -> bool {
    OsFamily::current() == OsFamily::Windows
}

/// Golden file name for the executing host
pub fn golden_file(name: &str) -> String {
    golden_file_for(name, OsFamily::current())
}

/// Golden file name for an explicit OS family
pub fn golden_file_for(name: &str, family: OsFamily) -> String {
    match family {
        OsFamily::Windows => format!("{name}-windows.golden"),
        OsFamily::Unix => format!("{name}.golden"),
    }
}

/// Server and client addresses for the API server
///
/// Returns `(server, client)`. They only differ on Windows, where the
/// client reaches the named pipe through a `unix` scheme.
pub fn server_addresses(config_dir: &Path) -> (String, String) {
    server_addresses_for(config_dir, OsFamily::current())
}

/// Server and client addresses for an explicit OS family
pub fn server_addresses_for(config_dir: &Path, family: OsFamily) -> (String, String) {
    match family {
        OsFamily::Windows => (
            format!("npipe:////./pipe/{PIPE_NAME}"),
            format!("unix:////./pipe/{PIPE_NAME}"),
        ),
        OsFamily::Unix => {
            let socket = format!("unix:///{}/{SOCKET_FILE}", config_dir.display());
            (socket.clone(), socket)
        }
    }
}

/// An IPC endpoint the API server listens on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    UnixSocket(PathBuf),
    NamedPipe(String),
}

impl Endpoint {
    /// Parse a `unix://` or `npipe://` server address
    pub fn parse(address: &str) -> Result<Self> {
        if let Some(path) = address.strip_prefix("unix://") {
            if path.is_empty() {
                return Err(Error::Config(format!("Empty socket path in '{address}'")));
            }
            return Ok(Endpoint::UnixSocket(PathBuf::from(path)));
        }
        if let Some(rest) = address.strip_prefix("npipe://") {
            let name = rest
                .rsplit_once("/pipe/")
                .map(|(_, name)| name)
                .filter(|name| !name.is_empty())
                .ok_or_else(|| Error::Config(format!("Invalid named pipe address '{address}'")))?;
            return Ok(Endpoint::NamedPipe(name.to_string()));
        }
        Err(Error::Config(format!(
            "Unsupported address scheme '{address}'. Supported: unix://, npipe://"
        )))
    }

    async fn connect(&self) -> io::Result<Stream> {
        match self {
            Endpoint::UnixSocket(path) => {
                let path = path.to_string_lossy().into_owned();
                let name = path.to_fs_name::<GenericFilePath>()?;
                Stream::connect(name).await
            }
            Endpoint::NamedPipe(pipe) => {
                let name = pipe.clone().to_ns_name::<GenericNamespaced>()?;
                Stream::connect(name).await
            }
        }
    }

    /// Whether something is accepting connections on this endpoint
    pub async fn is_ready(&self) -> bool {
        match self.connect().await {
            Ok(_) => true,
            Err(e) => {
                tracing::trace!(endpoint = ?self, error = %e, "Endpoint not ready");
                false
            }
        }
    }
}
