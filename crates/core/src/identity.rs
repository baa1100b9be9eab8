// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process identity forwarded to the controller at session start.
//!
//! Everything is held in wire form: raw bytes on Unix, UTF-8 elsewhere. The
//! environment fingerprint is computed from the *native* form while it is
//! still available, so on wide-character hosts it covers UTF-16 code units.

use std::ffi::{OsStr, OsString};

use crate::fingerprint::{fingerprint, Fingerprint};

/// Failure to read the host's process information.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("cannot get current working directory: {0}")]
    CurrentDir(#[source] std::io::Error),
}

/// Arguments, working directory and environment of this process.
///
/// Immutable after construction. The fingerprint is computed exactly once,
/// by the constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessIdentity {
    args: Vec<Vec<u8>>,
    cwd: Vec<u8>,
    env: Vec<Vec<u8>>,
    fingerprint: Fingerprint,
}

impl ProcessIdentity {
    /// Read the identity of the running process.
    ///
    /// `args` includes the program name. Environment entries keep the order
    /// the host enumerates them in.
    pub fn capture() -> Result<Self, CaptureError> {
        let args: Vec<OsString> = std::env::args_os().collect();
        let cwd = std::env::current_dir().map_err(CaptureError::CurrentDir)?;
        let env: Vec<OsString> = std::env::vars_os()
            .map(|(key, value)| {
                let mut entry = key;
                entry.push("=");
                entry.push(value);
                entry
            })
            .collect();

        let identity = Self {
            args: args.iter().map(|a| wire_bytes(a)).collect(),
            cwd: wire_bytes(cwd.as_os_str()),
            env: env.iter().map(|e| wire_bytes(e)).collect(),
            fingerprint: native_fingerprint(&env),
        };
        tracing::debug!(
            argc = identity.args.len(),
            envc = identity.env.len(),
            "captured process identity"
        );
        Ok(identity)
    }

    /// Build an identity from wire-form byte strings.
    ///
    /// The fingerprint is computed byte-wise over `env`, which is what a
    /// narrow-character host produces.
    pub fn from_parts(args: Vec<Vec<u8>>, cwd: Vec<u8>, env: Vec<Vec<u8>>) -> Self {
        let fingerprint = fingerprint::<u8, _>(&env);
        Self {
            args,
            cwd,
            env,
            fingerprint,
        }
    }

    pub fn args(&self) -> &[Vec<u8>] {
        &self.args
    }

    pub fn cwd(&self) -> &[u8] {
        &self.cwd
    }

    /// Environment entries in captured (host) order.
    pub fn env(&self) -> &[Vec<u8>] {
        &self.env
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }
}

#[cfg(unix)]
fn wire_bytes(s: &OsStr) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    s.as_bytes().to_vec()
}

#[cfg(not(unix))]
fn wire_bytes(s: &OsStr) -> Vec<u8> {
    s.to_string_lossy().into_owned().into_bytes()
}

#[cfg(windows)]
fn native_fingerprint(env: &[OsString]) -> Fingerprint {
    use std::os::windows::ffi::OsStrExt;
    let wide: Vec<Vec<u16>> = env.iter().map(|e| e.encode_wide().collect()).collect();
    fingerprint::<u16, _>(&wide)
}

#[cfg(not(windows))]
fn native_fingerprint(env: &[OsString]) -> Fingerprint {
    let narrow: Vec<Vec<u8>> = env.iter().map(|e| wire_bytes(e)).collect();
    fingerprint::<u8, _>(&narrow)
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
