use std::io::{Stdout, Write};
use std::time::Duration;

use bootshell_transport::Link;
use bytes::{BufMut, Bytes, BytesMut};
use tracing::{debug, trace, warn};

use crate::error::{FrameError, Result};
use crate::sync::{contains_sync, echo_payload, READ_CHUNK_SIZE, SYNC};

/// Configuration for the framer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramerConfig {
    /// Maximum bytes requested per read while echoing. Default: 4096.
    pub read_size: usize,
}

impl Default for FramerConfig {
    fn default() -> Self {
        Self {
            read_size: READ_CHUNK_SIZE,
        }
    }
}

/// Outcome of a single read-and-scan step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scan {
    /// Bytes returned by the read, markers included.
    pub received: usize,
    /// Whether any of them was the sync marker.
    pub saw_sync: bool,
}

/// Splits a console byte stream into sync-terminated packets.
///
/// Owns the link and an echo sink that receives remote output (stdout by
/// default). Every timeout is applied per poll, never summed across a
/// whole operation.
pub struct SyncFramer<L, W = Stdout> {
    link: L,
    echo: W,
    config: FramerConfig,
}

impl<L: Link> SyncFramer<L> {
    /// Create a framer that echoes remote output to stdout.
    pub fn new(link: L) -> Self {
        Self::with_echo(link, std::io::stdout())
    }
}

impl<L: Link, W: Write> SyncFramer<L, W> {
    /// Create a framer with an explicit echo sink.
    pub fn with_echo(link: L, echo: W) -> Self {
        Self::with_config(link, echo, FramerConfig::default())
    }

    /// Create a framer with an explicit echo sink and configuration.
    pub fn with_config(link: L, echo: W, config: FramerConfig) -> Self {
        Self { link, echo, config }
    }

    /// Read once (up to `read_size` bytes) and scan for the marker.
    ///
    /// Non-marker bytes go to the echo sink when `echo` is set. A remote
    /// close shows up as a zero-length scan with the link disconnected.
    pub fn read_packet(&mut self, echo: bool) -> Result<Scan> {
        let data = self.link.recv(self.config.read_size)?;
        if echo {
            if let Err(err) = echo_payload(&data, &mut self.echo) {
                debug!(error = %err, "echo sink rejected remote output");
            }
        }
        trace!(len = data.len(), "read packet");
        Ok(Scan {
            received: data.len(),
            saw_sync: contains_sync(&data),
        })
    }

    /// Echo remote output until a read contains the sync marker.
    ///
    /// Fails with [`FrameError::Timeout`] if a poll elapses first and with
    /// [`FrameError::Disconnected`] as soon as the link is down.
    pub fn wait_for_sync(&mut self, timeout: Duration, echo: bool) -> Result<()> {
        loop {
            if !self.link.is_connected() {
                return Err(FrameError::Disconnected);
            }
            if !self.link.poll(timeout) {
                return Err(self.stalled(timeout));
            }
            if self.read_packet(echo)?.saw_sync {
                return Ok(());
            }
        }
    }

    /// Collect a short reply one byte at a time, up to the sync marker.
    ///
    /// The marker itself is not part of the result. Bytes following it
    /// stay unread.
    pub fn wait_for_response(&mut self, timeout: Duration) -> Result<Bytes> {
        let mut response = BytesMut::new();
        loop {
            if !self.link.poll(timeout) {
                let err = self.stalled(timeout);
                if err.is_timeout() {
                    warn!(?timeout, "timeout while waiting for command response");
                }
                return Err(err);
            }

            let byte = self.link.recv(1)?;
            match byte.first() {
                None => return Err(FrameError::Disconnected),
                Some(&SYNC) => return Ok(response.freeze()),
                Some(&other) => response.put_u8(other),
            }
        }
    }

    /// Consume output until a poll times out and return how many bytes
    /// were drained. Markers are ignored.
    pub fn wait_for_idle(&mut self, timeout: Duration, echo: bool) -> usize {
        let mut drained = 0;
        while self.link.poll(timeout) {
            match self.read_packet(echo) {
                Ok(scan) => drained += scan.received,
                Err(err) => {
                    debug!(error = %err, "idle drain stopped");
                    break;
                }
            }
        }
        drained
    }

    /// Send raw bytes.
    pub fn send(&mut self, data: &[u8]) -> Result<usize> {
        Ok(self.link.send(data)?)
    }

    /// Send `line` terminated by a newline, in a single write.
    pub fn send_line(&mut self, line: &str) -> Result<()> {
        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');
        debug!(line, "sending command");
        self.send(&buf)?;
        Ok(())
    }

    /// Whether the underlying link is connected.
    pub fn is_connected(&self) -> bool {
        self.link.is_connected()
    }

    /// Borrow the underlying link.
    pub fn get_ref(&self) -> &L {
        &self.link
    }

    /// Mutably borrow the underlying link.
    pub fn get_mut(&mut self) -> &mut L {
        &mut self.link
    }

    /// Consume the framer and return the link.
    pub fn into_inner(self) -> L {
        self.link
    }

    /// Borrow the echo sink.
    pub fn echo_ref(&self) -> &W {
        &self.echo
    }

    /// Current framer configuration.
    pub fn config(&self) -> &FramerConfig {
        &self.config
    }

    fn stalled(&self, timeout: Duration) -> FrameError {
        if self.link.is_connected() {
            FrameError::Timeout(timeout)
        } else {
            FrameError::Disconnected
        }
    }
}
