use std::fs::File;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::os::fd::{AsRawFd, RawFd};
use std::path::PathBuf;

use tracing::warn;

/// A connected endpoint. The mode is fixed when the endpoint is opened.
pub enum Transport {
    /// TCP stream to a remote console.
    Socket(TcpStream),
    /// Character device opened once per direction.
    Device {
        reader: File,
        writer: File,
        path: PathBuf,
    },
}

impl Transport {
    /// Write `data` to the remote.
    ///
    /// For a socket this is a single `write` call: a short write is logged
    /// and reported through the returned count, not retried.
    pub fn send(&mut self, data: &[u8]) -> std::io::Result<usize> {
        match self {
            Transport::Socket(stream) => {
                let written = stream.write(data)?;
                if written < data.len() {
                    warn!(written, len = data.len(), "short write on socket");
                }
                Ok(written)
            }
            Transport::Device { writer, .. } => {
                writer.write_all(data)?;
                writer.flush()?;
                Ok(data.len())
            }
        }
    }

    /// Descriptor the readiness poller watches.
    pub fn read_fd(&self) -> RawFd {
        match self {
            Transport::Socket(stream) => stream.as_raw_fd(),
            Transport::Device { reader, .. } => reader.as_raw_fd(),
        }
    }

    /// Remote address or device path, for diagnostics.
    pub fn peer_name(&self) -> String {
        match self {
            Transport::Socket(stream) => stream
                .peer_addr()
                .map(|addr| addr.to_string())
                .unwrap_or_else(|_| "<unknown>".to_string()),
            Transport::Device { path, .. } => path.display().to_string(),
        }
    }

    /// Transport name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Transport::Socket(_) => "socket",
            Transport::Device { .. } => "device",
        }
    }
}

impl Read for Transport {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Transport::Socket(stream) => stream.read(buf),
            Transport::Device { reader, .. } => reader.read(buf),
        }
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transport::Socket(_) => f
                .debug_struct("Transport")
                .field("type", &"socket")
                .field("peer", &self.peer_name())
                .finish(),
            Transport::Device { path, .. } => f
                .debug_struct("Transport")
                .field("type", &"device")
                .field("path", path)
                .finish(),
        }
    }
}
