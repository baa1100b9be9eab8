// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error type that carries a process exit code.
//!
//! Every fatal path returns an `ExitError` instead of calling
//! `std::process::exit()` directly, so teardown runs before `main()` exits.

use std::fmt;

use rj_core::CaptureError;
use rj_wire::{ResourceError, SessionError, FATAL_EXIT_CODE};

use crate::connect::ConnectError;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self::new(FATAL_EXIT_CODE, message)
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}

impl From<SessionError> for ExitError {
    fn from(e: SessionError) -> Self {
        Self::new(e.exit_code(), e.to_string())
    }
}

impl From<ResourceError> for ExitError {
    fn from(e: ResourceError) -> Self {
        Self::fatal(e.to_string())
    }
}

impl From<ConnectError> for ExitError {
    fn from(e: ConnectError) -> Self {
        Self::fatal(e.to_string())
    }
}

impl From<CaptureError> for ExitError {
    fn from(e: CaptureError) -> Self {
        Self::fatal(e.to_string())
    }
}

#[cfg(test)]
#[path = "exit_error_tests.rs"]
mod tests;
