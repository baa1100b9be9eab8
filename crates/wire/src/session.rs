// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command dispatcher.
//!
//! A session owns everything one connection needs: the channel, the captured
//! identity and the two output sinks. It moves through
//! `Handshaking -> CommandLoop -> Terminated` and never goes back. Every path
//! into `Terminated` releases the channel.

use std::io::Write;

use rj_core::ProcessIdentity;

use crate::channel::{wire_len, Channel};
use crate::command::{Command, OutputStream};
use crate::error::{ProtocolError, SessionError};
use crate::handshake::write_handshake;
use crate::transport::Transport;

/// Upper bound on a single Write payload transfer to a sink.
pub const TRANSFER_CHUNK: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Handshaking,
    CommandLoop,
    Terminated,
}

pub struct Session<T: Transport, O, E> {
    state: SessionState,
    channel: Channel<T>,
    identity: ProcessIdentity,
    stdout: O,
    stderr: E,
}

impl<T: Transport, O: Write, E: Write> Session<T, O, E> {
    pub fn new(channel: Channel<T>, identity: ProcessIdentity, stdout: O, stderr: E) -> Self {
        Self {
            state: SessionState::Handshaking,
            channel,
            identity,
            stdout,
            stderr,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn channel(&self) -> &Channel<T> {
        &self.channel
    }

    pub fn identity(&self) -> &ProcessIdentity {
        &self.identity
    }

    /// Send the handshake and enter the command loop.
    pub fn handshake(&mut self) -> Result<(), SessionError> {
        self.require(SessionState::Handshaking)?;
        if let Err(e) = write_handshake(&mut self.channel, &self.identity) {
            self.terminate();
            return Err(e);
        }
        self.state = SessionState::CommandLoop;
        Ok(())
    }

    /// Read and execute one command.
    ///
    /// Returns `Some(status)` when the controller asked the stub to exit. Any
    /// error terminates the session before it is returned.
    pub fn step(&mut self) -> Result<Option<i32>, SessionError> {
        self.require(SessionState::CommandLoop)?;
        let outcome = self.dispatch();
        if outcome.is_err() {
            self.terminate();
        }
        outcome
    }

    /// Run the session to completion and return the process exit status.
    pub fn run(mut self) -> Result<i32, SessionError> {
        let span = tracing::info_span!("stub.session", exit_code = tracing::field::Empty);
        let _guard = span.enter();

        let result = self.drive();
        self.terminate();

        match &result {
            Ok(status) => {
                span.record("exit_code", status);
                tracing::info!(status, "controller requested exit");
            }
            Err(e) => {
                span.record("exit_code", e.exit_code());
                tracing::error!(error = %e, "session failed");
            }
        }
        result
    }

    /// Release the channel without further I/O. Idempotent.
    pub fn terminate(&mut self) {
        if self.state != SessionState::Terminated {
            tracing::debug!(from = ?self.state, "session terminated");
            self.state = SessionState::Terminated;
            self.channel.release();
        }
    }

    fn drive(&mut self) -> Result<i32, SessionError> {
        if self.state == SessionState::Handshaking {
            self.handshake()?;
        }
        loop {
            if let Some(status) = self.step()? {
                return Ok(status);
            }
        }
    }

    fn require(&self, expected: SessionState) -> Result<(), SessionError> {
        if self.state != expected {
            return Err(SessionError::InvalidState { state: self.state });
        }
        Ok(())
    }

    fn dispatch(&mut self) -> Result<Option<i32>, SessionError> {
        let command = Command::read(&mut self.channel)?;
        let span = tracing::info_span!(
            "stub.command",
            opcode = command.opcode(),
            length = tracing::field::Empty
        );
        let _guard = span.enter();

        match command {
            Command::Exit { status } => {
                // Nothing should be pending here; if it is, the controller
                // is already gone and the exit status still stands.
                if let Err(e) = self.channel.flush() {
                    tracing::warn!(error = %e, "discarding unsent bytes at exit");
                }
                self.terminate();
                Ok(Some(status))
            }
            Command::Write { stream, length } => {
                span.record("length", length);
                self.forward(stream, length)?;
                Ok(None)
            }
            Command::GetEnv => {
                self.reply_env()?;
                Ok(None)
            }
            Command::VersionMismatch { code } => {
                tracing::error!(opcode = code, "unknown opcode");
                self.terminate();
                Err(ProtocolError::VersionMismatch { opcode: code }.into())
            }
        }
    }

    /// Stream a Write payload from the channel into the selected sink.
    fn forward(&mut self, stream: OutputStream, length: u32) -> Result<(), SessionError> {
        let sink: &mut dyn Write = match stream {
            OutputStream::Stdout => &mut self.stdout,
            OutputStream::Stderr => &mut self.stderr,
        };
        let output_error = |source: std::io::Error| SessionError::Output { stream, source };

        let mut remaining = length as usize;
        while remaining > 0 {
            let chunk = self.channel.recv_chunk(remaining.min(TRANSFER_CHUNK))?;
            remaining -= chunk.len();
            sink.write_all(chunk).map_err(output_error)?;
        }
        sink.flush().map_err(output_error)
    }

    /// Reply to GetEnv with the captured entries in host order.
    fn reply_env(&mut self) -> Result<(), SessionError> {
        let env = self.identity.env();
        self.channel.send_u32(wire_len(env.len())?)?;
        for entry in env {
            self.channel.send_string(entry)?;
        }
        tracing::debug!(count = env.len(), "queued environment reply");
        Ok(())
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
