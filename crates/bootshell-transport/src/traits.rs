use std::time::Duration;

use bytes::Bytes;

use crate::error::Result;

/// A connected duplex byte stream with readiness polling.
///
/// Implemented by [`Connection`](crate::Connection). Higher layers only see
/// this trait, so they can be driven by an in-memory remote in tests.
pub trait Link {
    /// Whether an endpoint is currently open.
    fn is_connected(&self) -> bool;

    /// Write `data` to the remote and return how many bytes were accepted.
    fn send(&mut self, data: &[u8]) -> Result<usize>;

    /// Blocking read of at most `max_size` bytes.
    ///
    /// An empty result means the remote closed the stream; the link is
    /// disconnected by the time this returns.
    fn recv(&mut self, max_size: usize) -> Result<Bytes>;

    /// Whether the stream becomes readable within `timeout`.
    ///
    /// Always `false` when not connected.
    fn poll(&mut self, timeout: Duration) -> bool;
}
