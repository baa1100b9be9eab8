// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote jobs wire protocol.
//!
//! All integers are 4-byte little-endian. After the stub's handshake the
//! controller drives the session with opcode-tagged commands until it sends
//! Exit or something fatal happens.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod channel;
mod command;
mod error;
mod handshake;
mod session;
mod transport;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use channel::{Channel, DEFAULT_BUFFER_CAPACITY};
pub use command::{Command, OutputStream, OP_EXIT, OP_GET_ENV, OP_STDERR, OP_STDOUT};
pub use error::{ProtocolError, ResourceError, SessionError, TransportError, FATAL_EXIT_CODE};
pub use handshake::{write_handshake, MAGIC_VERSION};
pub use session::{Session, SessionState, TRANSFER_CHUNK};
pub use transport::{StreamTransport, Transport};
