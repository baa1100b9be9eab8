// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session errors.
//!
//! Every error is terminal: the session is torn down and the process exits
//! with [`FATAL_EXIT_CODE`]. A torn read or write leaves the framing state of
//! both ends unknown, so nothing is retried.

use std::io;

use crate::command::OutputStream;
use crate::session::SessionState;

/// Exit status reported for every fatal condition.
pub const FATAL_EXIT_CODE: i32 = 99;

/// The partial-transfer primitives failed or made no progress.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("sending to controller failed: {0}")]
    Send(#[source] io::Error),

    #[error("communication with controller failed: {0}")]
    Recv(#[source] io::Error),

    #[error("controller stopped receiving data")]
    SendClosed,

    #[error("controller closed communication unexpectedly")]
    RecvClosed,

    #[error("transport already released")]
    Released,
}

/// The controller sent something this stub does not understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("controller version mismatch (opcode {opcode})")]
    VersionMismatch { opcode: u32 },

    /// A length or count does not fit the 32-bit wire field.
    #[error("length {len} does not fit in a 32-bit wire field")]
    LengthOverflow { len: usize },
}

/// Buffer setup failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceError {
    #[error("{what} capacity must be non-zero")]
    ZeroCapacity { what: &'static str },

    #[error("cannot allocate {size} bytes for {what}")]
    Alloc { what: &'static str, size: usize },
}

/// Any failure that ends a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Writing a controller payload to stdout or stderr failed.
    #[error("write to {stream} failed: {source}")]
    Output {
        stream: OutputStream,
        #[source]
        source: io::Error,
    },

    /// An operation was attempted in a state that does not allow it.
    #[error("session is {state:?}")]
    InvalidState { state: SessionState },
}

impl SessionError {
    /// Exit status the process reports for this error.
    pub fn exit_code(&self) -> i32 {
        FATAL_EXIT_CODE
    }
}
