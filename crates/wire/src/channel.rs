// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Buffered duplex channel: exact-size transfers over a partial transport.
//!
//! Outbound bytes accumulate until the buffer is full or a read needs the
//! transport. Pending outbound bytes are always flushed before a blocking
//! read, so the controller never waits on data that is still buffered here.

use crate::error::{ProtocolError, ResourceError, SessionError, TransportError};
use crate::transport::Transport;

/// Default capacity of each direction's buffer.
pub const DEFAULT_BUFFER_CAPACITY: usize = 2048;

/// Buffered exact-size I/O over a [`Transport`].
pub struct Channel<T> {
    transport: T,
    capacity: usize,
    /// Pending outbound bytes; never longer than `capacity`.
    outbound: Vec<u8>,
    inbound: Vec<u8>,
    /// Bytes of `inbound` holding received data.
    filled: usize,
    /// Next unread byte of `inbound`.
    cursor: usize,
    released: bool,
}

impl<T: Transport> Channel<T> {
    pub fn new(transport: T) -> Result<Self, ResourceError> {
        Self::with_capacity(transport, DEFAULT_BUFFER_CAPACITY)
    }

    /// Create a channel whose buffers each hold `capacity` bytes.
    pub fn with_capacity(transport: T, capacity: usize) -> Result<Self, ResourceError> {
        if capacity == 0 {
            return Err(ResourceError::ZeroCapacity {
                what: "channel buffer",
            });
        }
        let mut outbound = Vec::new();
        outbound
            .try_reserve_exact(capacity)
            .map_err(|_| ResourceError::Alloc {
                what: "outbound buffer",
                size: capacity,
            })?;
        let mut inbound = Vec::new();
        inbound
            .try_reserve_exact(capacity)
            .map_err(|_| ResourceError::Alloc {
                what: "inbound buffer",
                size: capacity,
            })?;
        inbound.resize(capacity, 0);

        Ok(Self {
            transport,
            capacity,
            outbound,
            inbound,
            filled: 0,
            cursor: 0,
            released: false,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes accepted by `send_*` that have not reached the transport yet.
    pub fn pending_outbound(&self) -> usize {
        self.outbound.len()
    }

    /// Received bytes not yet handed out.
    pub fn buffered_inbound(&self) -> usize {
        self.filled - self.cursor
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Queue all of `data`, flushing whenever the outbound buffer fills.
    pub fn send_exact(&mut self, mut data: &[u8]) -> Result<(), TransportError> {
        self.ensure_open()?;
        while !data.is_empty() {
            let take = (self.capacity - self.outbound.len()).min(data.len());
            self.outbound.extend_from_slice(&data[..take]);
            data = &data[take..];
            if self.outbound.len() == self.capacity {
                self.flush()?;
            }
        }
        Ok(())
    }

    pub fn send_u32(&mut self, value: u32) -> Result<(), TransportError> {
        self.send_exact(&value.to_le_bytes())
    }

    /// Send a length-prefixed byte string (no terminator).
    pub fn send_string(&mut self, bytes: &[u8]) -> Result<(), SessionError> {
        self.send_u32(wire_len(bytes.len())?)?;
        self.send_exact(bytes)?;
        Ok(())
    }

    /// Push every pending outbound byte to the transport.
    pub fn flush(&mut self) -> Result<(), TransportError> {
        self.ensure_open()?;
        let mut sent = 0;
        while sent < self.outbound.len() {
            match self.transport.raw_send(&self.outbound[sent..]) {
                Ok(0) => return Err(TransportError::SendClosed),
                Ok(n) => sent += n.min(self.outbound.len() - sent),
                Err(e) => return Err(TransportError::Send(e)),
            }
        }
        if sent > 0 {
            tracing::trace!(bytes = sent, "flushed outbound buffer");
        }
        self.outbound.clear();
        Ok(())
    }

    /// Fill `out` completely, refilling the inbound buffer as often as needed.
    pub fn recv_into(&mut self, out: &mut [u8]) -> Result<(), TransportError> {
        let mut done = 0;
        while done < out.len() {
            let chunk = self.recv_chunk(out.len() - done)?;
            out[done..done + chunk.len()].copy_from_slice(chunk);
            done += chunk.len();
        }
        Ok(())
    }

    /// Receive exactly `n` bytes.
    pub fn recv_exact(&mut self, n: usize) -> Result<Vec<u8>, TransportError> {
        let mut out = vec![0u8; n];
        self.recv_into(&mut out)?;
        Ok(out)
    }

    pub fn recv_u32(&mut self) -> Result<u32, TransportError> {
        let mut bytes = [0u8; 4];
        self.recv_into(&mut bytes)?;
        Ok(u32::from_le_bytes(bytes))
    }

    pub fn recv_i32(&mut self) -> Result<i32, TransportError> {
        let mut bytes = [0u8; 4];
        self.recv_into(&mut bytes)?;
        Ok(i32::from_le_bytes(bytes))
    }

    /// Receive a length-prefixed byte string.
    pub fn recv_string(&mut self) -> Result<Vec<u8>, TransportError> {
        let len = self.recv_u32()?;
        self.recv_exact(len as usize)
    }

    /// Borrow up to `max` buffered bytes, refilling once if none are left.
    ///
    /// Returns at least one byte unless `max` is zero.
    pub fn recv_chunk(&mut self, max: usize) -> Result<&[u8], TransportError> {
        self.ensure_open()?;
        if max == 0 {
            return Ok(&[]);
        }
        self.fill()?;
        let n = max.min(self.filled - self.cursor);
        let start = self.cursor;
        self.cursor += n;
        Ok(&self.inbound[start..start + n])
    }

    /// Tear down the transport without sending or receiving anything.
    ///
    /// Pending outbound bytes are discarded. Idempotent.
    pub fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.outbound.clear();
            self.transport.release();
        }
    }

    fn fill(&mut self) -> Result<(), TransportError> {
        if self.cursor < self.filled {
            return Ok(());
        }
        self.flush()?;
        let n = match self.transport.raw_recv(&mut self.inbound) {
            Ok(0) => return Err(TransportError::RecvClosed),
            Ok(n) => n.min(self.capacity),
            Err(e) => return Err(TransportError::Recv(e)),
        };
        tracing::trace!(bytes = n, "refilled inbound buffer");
        self.cursor = 0;
        self.filled = n;
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), TransportError> {
        if self.released {
            return Err(TransportError::Released);
        }
        Ok(())
    }
}

/// Convert a byte count or item count to its 32-bit wire field.
pub(crate) fn wire_len(len: usize) -> Result<u32, ProtocolError> {
    u32::try_from(len).map_err(|_| ProtocolError::LengthOverflow { len })
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
