// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The byte-stream capability the channel is built on.

use std::fmt;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// A blocking byte stream that only promises partial progress per call.
///
/// Implementations report whatever the underlying endpoint did; the channel
/// decides that a zero-byte transfer or an error is fatal.
pub trait Transport {
    /// Send a prefix of `buf`, returning how many bytes were accepted.
    fn raw_send(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Receive into a prefix of `buf`, returning how many bytes arrived.
    fn raw_recv(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Close the endpoint and remove anything it left on disk.
    ///
    /// Must be idempotent and must not send or receive.
    fn release(&mut self);
}

/// [`Transport`] over any blocking `Read + Write` stream.
///
/// Used with a Unix domain socket (which owns a bound client path) or with a
/// named-pipe file handle.
pub struct StreamTransport<S> {
    stream: Option<S>,
    artifact: Option<PathBuf>,
}

impl<S> StreamTransport<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream: Some(stream),
            artifact: None,
        }
    }

    /// Like [`StreamTransport::new`], additionally removing `path` on release.
    pub fn with_artifact(stream: S, path: impl Into<PathBuf>) -> Self {
        Self {
            stream: Some(stream),
            artifact: Some(path.into()),
        }
    }

    pub fn artifact(&self) -> Option<&Path> {
        self.artifact.as_deref()
    }

    pub fn is_released(&self) -> bool {
        self.stream.is_none()
    }

    fn stream_mut(&mut self) -> io::Result<&mut S> {
        self.stream
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "transport released"))
    }

    fn teardown(&mut self) {
        // Dropping the stream closes the descriptor.
        if self.stream.take().is_some() {
            tracing::debug!("transport closed");
        }
        if let Some(path) = self.artifact.take() {
            match std::fs::remove_file(&path) {
                Ok(()) => tracing::debug!(path = %path.display(), "removed transport endpoint"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to remove endpoint")
                }
            }
        }
    }
}

impl<S> fmt::Debug for StreamTransport<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamTransport")
            .field("released", &self.is_released())
            .field("artifact", &self.artifact)
            .finish()
    }
}

impl<S: Read + Write> Transport for StreamTransport<S> {
    fn raw_send(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream_mut()?.write(buf)
    }

    fn raw_recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream_mut()?.read(buf)
    }

    fn release(&mut self) {
        self.teardown();
    }
}

impl<S> Drop for StreamTransport<S> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
