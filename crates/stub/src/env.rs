// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the stub.
//!
//! The stub takes no flags: every argument belongs to the remote program.

use std::path::PathBuf;

/// Name shared by the socket directory and the pipe namespace.
pub const CONNECTION_PREFIX: &str = "RemJobs75oKmnN7rWX";

/// Controller endpoint selector (default `"0"`).
pub fn connection_id() -> String {
    std::env::var("REMOTE_JOBS_CONNECTION_ID")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "0".to_string())
}

/// Resolve socket directory: REMOTE_JOBS_SOCKET_DIR > /tmp/RemJobs75oKmnN7rWX
pub fn socket_dir() -> PathBuf {
    match std::env::var_os("REMOTE_JOBS_SOCKET_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => PathBuf::from("/tmp").join(CONNECTION_PREFIX),
    }
}

/// Log file path. Logging is off when unset.
pub fn log_path() -> Option<PathBuf> {
    std::env::var_os("REMOTE_JOBS_LOG")
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

/// `EnvFilter` directive for the log file (default `info`).
pub fn log_level() -> String {
    std::env::var("REMOTE_JOBS_LOG_LEVEL")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "info".to_string())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
