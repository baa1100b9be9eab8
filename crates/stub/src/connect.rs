// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transport acquisition.
//!
//! Unix: a stream socket bound to `<dir>/<id>C<pid>` and connected to the
//! controller at `<dir>/<id>S`. The bound path is removed when the transport
//! is released. Windows: the named pipe `\\.\pipe\RemJobs75oKmnN7rWX.<id>`.

use std::io;
use std::path::{Path, PathBuf};

use rj_wire::StreamTransport;

use crate::env::CONNECTION_PREFIX;

/// Capacity of `sockaddr_un.sun_path`, including the terminating NUL.
pub const SUN_PATH_MAX: usize = 108;

#[cfg(unix)]
pub type StubTransport = StreamTransport<std::os::unix::net::UnixStream>;

#[cfg(windows)]
pub type StubTransport = StreamTransport<std::fs::File>;

#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("connection id too long")]
    IdTooLong { path: PathBuf },

    #[error("cannot create UNIX socket: {0}")]
    Socket(#[source] io::Error),

    #[error("cannot bind path to UNIX socket: {0}")]
    Bind(#[source] io::Error),

    #[error("cannot connect to controller: {0}")]
    Connect(#[source] io::Error),
}

/// Socket paths for one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub controller: PathBuf,
    pub client: PathBuf,
}

impl Endpoints {
    pub fn new(dir: &Path, id: &str, pid: u32) -> Result<Self, ConnectError> {
        let endpoints = Self {
            controller: dir.join(format!("{id}S")),
            client: dir.join(format!("{id}C{pid}")),
        };
        for path in [&endpoints.controller, &endpoints.client] {
            if path.as_os_str().len() >= SUN_PATH_MAX {
                return Err(ConnectError::IdTooLong { path: path.clone() });
            }
        }
        Ok(endpoints)
    }
}

/// Named pipe the controller listens on for `id`.
pub fn pipe_path(id: &str) -> String {
    format!(r"\\.\pipe\{CONNECTION_PREFIX}.{id}")
}

/// Connect to the controller for `id`, binding the client socket under `dir`.
#[cfg(unix)]
pub fn connect(dir: &Path, id: &str) -> Result<StubTransport, ConnectError> {
    use std::os::fd::AsRawFd;
    use std::os::unix::fs::DirBuilderExt;
    use std::os::unix::net::UnixStream;

    use nix::sys::socket::{self, AddressFamily, SockFlag, SockType, UnixAddr};

    let endpoints = Endpoints::new(dir, id, std::process::id())?;
    let too_long = |path: &Path| ConnectError::IdTooLong {
        path: path.to_path_buf(),
    };
    let client_addr = UnixAddr::new(&endpoints.client).map_err(|_| too_long(&endpoints.client))?;
    let controller_addr =
        UnixAddr::new(&endpoints.controller).map_err(|_| too_long(&endpoints.controller))?;

    // A failure here surfaces as a bind error below.
    let created = std::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o777)
        .create(dir);
    if let Err(e) = created {
        tracing::debug!(dir = %dir.display(), error = %e, "cannot create socket directory");
    }

    let fd = socket::socket(
        AddressFamily::Unix,
        SockType::Stream,
        SockFlag::empty(),
        None,
    )
    .map_err(|e| ConnectError::Socket(e.into()))?;

    remove_endpoint(&endpoints.client);
    socket::bind(fd.as_raw_fd(), &client_addr).map_err(|e| ConnectError::Bind(e.into()))?;

    if let Err(e) = socket::connect(fd.as_raw_fd(), &controller_addr) {
        remove_endpoint(&endpoints.client);
        return Err(ConnectError::Connect(e.into()));
    }

    tracing::info!(
        controller = %endpoints.controller.display(),
        client = %endpoints.client.display(),
        "connected to controller"
    );
    Ok(StreamTransport::with_artifact(UnixStream::from(fd), endpoints.client))
}

/// Open the controller's named pipe for `id`.
#[cfg(windows)]
pub fn connect(_dir: &Path, id: &str) -> Result<StubTransport, ConnectError> {
    let path = pipe_path(id);
    let pipe = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open(&path)
        .map_err(ConnectError::Connect)?;
    tracing::info!(pipe = %path, "connected to controller");
    Ok(StreamTransport::new(pipe))
}

#[cfg(unix)]
fn remove_endpoint(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "removed client endpoint"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "cannot remove endpoint"),
    }
}

#[cfg(test)]
#[path = "connect_tests.rs"]
mod tests;
