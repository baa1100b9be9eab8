// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Commands the controller sends once the handshake is done.

use std::fmt;

use crate::channel::Channel;
use crate::error::TransportError;
use crate::transport::Transport;

pub const OP_EXIT: u32 = 0;
pub const OP_STDOUT: u32 = 1;
pub const OP_STDERR: u32 = 2;
pub const OP_GET_ENV: u32 = 3;

/// Which local stream a Write command targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    pub fn opcode(self) -> u32 {
        match self {
            OutputStream::Stdout => OP_STDOUT,
            OutputStream::Stderr => OP_STDERR,
        }
    }
}

impl fmt::Display for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputStream::Stdout => write!(f, "stdout"),
            OutputStream::Stderr => write!(f, "stderr"),
        }
    }
}

/// A decoded command header.
///
/// `Write` carries only the payload length; the payload itself is streamed
/// off the channel by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Exit { status: i32 },
    Write { stream: OutputStream, length: u32 },
    GetEnv,
    /// Any opcode this stub does not know. Always fatal.
    VersionMismatch { code: u32 },
}

impl Command {
    /// Read one command header from the channel.
    ///
    /// An unknown opcode is returned as [`Command::VersionMismatch`] without
    /// reading anything past it.
    pub fn read<T: Transport>(channel: &mut Channel<T>) -> Result<Self, TransportError> {
        let opcode = channel.recv_u32()?;
        let command = match opcode {
            OP_EXIT => Command::Exit {
                status: channel.recv_i32()?,
            },
            OP_STDOUT | OP_STDERR => {
                let stream = if opcode == OP_STDOUT {
                    OutputStream::Stdout
                } else {
                    OutputStream::Stderr
                };
                Command::Write {
                    stream,
                    length: channel.recv_u32()?,
                }
            }
            OP_GET_ENV => Command::GetEnv,
            code => Command::VersionMismatch { code },
        };
        Ok(command)
    }

    pub fn opcode(&self) -> u32 {
        match self {
            Command::Exit { .. } => OP_EXIT,
            Command::Write { stream, .. } => stream.opcode(),
            Command::GetEnv => OP_GET_ENV,
            Command::VersionMismatch { code } => *code,
        }
    }

    /// Header bytes as the controller puts them on the wire.
    ///
    /// A Write payload is not included.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = self.opcode().to_le_bytes().to_vec();
        match self {
            Command::Exit { status } => out.extend_from_slice(&status.to_le_bytes()),
            Command::Write { length, .. } => out.extend_from_slice(&length.to_le_bytes()),
            Command::GetEnv | Command::VersionMismatch { .. } => {}
        }
        out
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
