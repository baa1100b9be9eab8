// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory transport and wire readers for tests.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::transport::Transport;

/// One call observed by [`FakeTransport`], in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeCall {
    Send(usize),
    Recv(usize),
    Release,
}

#[derive(Default)]
struct FakeState {
    /// Scripted inbound data; each entry is delivered by separate `raw_recv` calls.
    inbound: VecDeque<Vec<u8>>,
    sent: Vec<u8>,
    send_limit: Option<usize>,
    fail_send: Option<io::ErrorKind>,
    fail_recv: Option<io::ErrorKind>,
    calls: Vec<FakeCall>,
    released: bool,
}

/// Scriptable [`Transport`] whose state is shared between clones.
///
/// Hand one clone to the channel and keep another to inspect what was sent.
/// When the scripted inbound data runs out, `raw_recv` reports end of stream.
#[derive(Clone, Default)]
pub struct FakeTransport {
    state: Arc<Mutex<FakeState>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes for the stub to receive, all available in one `raw_recv`.
    pub fn push_inbound(&self, bytes: impl Into<Vec<u8>>) {
        let bytes = bytes.into();
        if !bytes.is_empty() {
            self.state.lock().inbound.push_back(bytes);
        }
    }

    /// Queue bytes split into deliveries of at most `chunk` bytes each.
    pub fn push_inbound_chunked(&self, bytes: &[u8], chunk: usize) {
        for piece in bytes.chunks(chunk.max(1)) {
            self.push_inbound(piece);
        }
    }

    /// Accept at most `limit` bytes per `raw_send`.
    pub fn set_send_limit(&self, limit: usize) {
        self.state.lock().send_limit = Some(limit.max(1));
    }

    /// Make every later `raw_send` fail with `kind`.
    pub fn fail_sends(&self, kind: io::ErrorKind) {
        self.state.lock().fail_send = Some(kind);
    }

    /// Make every later `raw_recv` fail with `kind`.
    pub fn fail_recvs(&self, kind: io::ErrorKind) {
        self.state.lock().fail_recv = Some(kind);
    }

    /// Everything the transport accepted so far.
    pub fn sent(&self) -> Vec<u8> {
        self.state.lock().sent.clone()
    }

    pub fn calls(&self) -> Vec<FakeCall> {
        self.state.lock().calls.clone()
    }

    /// Number of `raw_send` and `raw_recv` calls made so far.
    pub fn io_calls(&self) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| !matches!(c, FakeCall::Release))
            .count()
    }

    pub fn is_released(&self) -> bool {
        self.state.lock().released
    }

    /// Scripted inbound bytes the stub has not consumed.
    pub fn unread_inbound(&self) -> usize {
        self.state.lock().inbound.iter().map(Vec::len).sum()
    }
}

impl Transport for FakeTransport {
    fn raw_send(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.lock();
        if state.released {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "fake released"));
        }
        if let Some(kind) = state.fail_send {
            return Err(io::Error::new(kind, "fake send failure"));
        }
        let n = state.send_limit.map_or(buf.len(), |limit| limit.min(buf.len()));
        state.sent.extend_from_slice(&buf[..n]);
        state.calls.push(FakeCall::Send(n));
        Ok(n)
    }

    fn raw_recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state.lock();
        if state.released {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "fake released"));
        }
        if let Some(kind) = state.fail_recv {
            return Err(io::Error::new(kind, "fake recv failure"));
        }
        let Some(front) = state.inbound.front_mut() else {
            state.calls.push(FakeCall::Recv(0));
            return Ok(0);
        };
        let n = front.len().min(buf.len());
        buf[..n].copy_from_slice(&front[..n]);
        front.drain(..n);
        if front.is_empty() {
            state.inbound.pop_front();
        }
        state.calls.push(FakeCall::Recv(n));
        Ok(n)
    }

    fn release(&mut self) {
        let mut state = self.state.lock();
        if !state.released {
            state.released = true;
            state.calls.push(FakeCall::Release);
        }
    }
}

/// Cursor over bytes the stub sent, reading the controller's view of the wire.
pub struct WireReader<'a> {
    bytes: &'a [u8],
}

impl<'a> WireReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    pub fn read_u32(&mut self) -> Option<u32> {
        let (head, rest) = self.bytes.split_first_chunk::<4>()?;
        self.bytes = rest;
        Some(u32::from_le_bytes(*head))
    }

    pub fn read_bytes(&mut self, n: usize) -> Option<&'a [u8]> {
        if self.bytes.len() < n {
            return None;
        }
        let (head, rest) = self.bytes.split_at(n);
        self.bytes = rest;
        Some(head)
    }

    /// Read a length-prefixed string.
    pub fn read_string(&mut self) -> Option<&'a [u8]> {
        let len = self.read_u32()? as usize;
        self.read_bytes(len)
    }

    pub fn remaining(&self) -> &'a [u8] {
        self.bytes
    }
}

/// Handshake fields as the controller decodes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedHandshake {
    pub magic: u32,
    pub args: Vec<Vec<u8>>,
    pub cwd: Vec<u8>,
    pub fingerprint: Vec<u8>,
}

impl DecodedHandshake {
    /// Decode a handshake from the front of `reader`.
    pub fn read(reader: &mut WireReader<'_>) -> Option<Self> {
        let magic = reader.read_u32()?;
        let argc = reader.read_u32()?;
        let mut args = Vec::new();
        for _ in 0..argc {
            args.push(reader.read_string()?.to_vec());
        }
        let cwd = reader.read_string()?.to_vec();
        let fingerprint = reader.read_string()?.to_vec();
        Some(Self {
            magic,
            args,
            cwd,
            fingerprint,
        })
    }
}

/// Decode a GetEnv reply from the front of `reader`.
pub fn read_env_reply(reader: &mut WireReader<'_>) -> Option<Vec<Vec<u8>>> {
    let count = reader.read_u32()?;
    let mut entries = Vec::new();
    for _ in 0..count {
        entries.push(reader.read_string()?.to_vec());
    }
    Some(entries)
}
