// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rj-stub: runs in place of a remote program and lets the controller drive
//! its output and exit status.

pub mod connect;
pub mod env;
pub mod exit_error;
pub mod logging;

use std::io::{self, Write};

use rj_core::ProcessIdentity;
use rj_wire::{Channel, Session, Transport};

pub use exit_error::ExitError;

/// Capture this process, connect to the controller and serve the session.
///
/// Returns the status the controller asked the stub to exit with.
pub fn run() -> Result<i32, ExitError> {
    let socket_dir = env::socket_dir();
    let connection_id = env::connection_id();

    let identity = ProcessIdentity::capture()?;
    let transport = connect::connect(&socket_dir, &connection_id)?;
    serve(transport, identity, io::stdout().lock(), io::stderr().lock())
}

/// Serve one session over an already connected transport.
pub fn serve<T, O, E>(
    transport: T,
    identity: ProcessIdentity,
    stdout: O,
    stderr: E,
) -> Result<i32, ExitError>
where
    T: Transport,
    O: Write,
    E: Write,
{
    let channel = Channel::new(transport)?;
    Ok(Session::new(channel, identity, stdout, stderr).run()?)
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
