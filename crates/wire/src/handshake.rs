// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection handshake: the first and only unsolicited message.

use rj_core::{to_hex, ProcessIdentity};

use crate::channel::{wire_len, Channel};
use crate::error::SessionError;
use crate::transport::Transport;

/// Magic in the high 24 bits, protocol version in the low 8.
pub const MAGIC_VERSION: u32 = 0x7F4A_9400;

/// Send the handshake for `identity` and flush it.
///
/// Layout: magic+version, argc, each argument, the working directory, then
/// the fingerprint, all length fields little-endian u32.
pub fn write_handshake<T: Transport>(
    channel: &mut Channel<T>,
    identity: &ProcessIdentity,
) -> Result<(), SessionError> {
    channel.send_u32(MAGIC_VERSION)?;
    channel.send_u32(wire_len(identity.args().len())?)?;
    for arg in identity.args() {
        channel.send_string(arg)?;
    }
    channel.send_string(identity.cwd())?;
    channel.send_string(identity.fingerprint())?;
    channel.flush()?;

    tracing::debug!(
        argc = identity.args().len(),
        fingerprint = %to_hex(identity.fingerprint()),
        "handshake sent"
    );
    Ok(())
}

#[cfg(test)]
#[path = "handshake_tests.rs"]
mod tests;
