// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-only logging.
//!
//! The stub's stdout and stderr carry the remote program's output, so events
//! go to `REMOTE_JOBS_LOG` or nowhere.

use std::path::Path;

use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("log path has no file name: {0}")]
    NoFileName(String),

    #[error("cannot open log file: {0}")]
    Appender(#[from] InitError),

    #[error("cannot install subscriber: {0}")]
    Subscriber(#[from] TryInitError),
}

/// Install a global subscriber appending to `path`, filtered by `level`.
///
/// An unparsable `level` falls back to `info`.
pub fn init(path: &Path, level: &str) -> Result<(), LoggingError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| LoggingError::NoFileName(path.display().to_string()))?
        .to_string_lossy()
        .into_owned();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(dir)?;
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(appender)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init()?;
    Ok(())
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
