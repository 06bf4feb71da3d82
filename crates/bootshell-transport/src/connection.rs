use std::fmt;
use std::io::{ErrorKind, Read};
use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::device;
use crate::error::{Result, TransportError};
use crate::poll::Poller;
use crate::tcp::{connect_with_retry, RetryConfig};
use crate::traits::Link;
use crate::transport::Transport;

/// Where to find the remote console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// TCP endpoint, e.g. an emulator UART bridge.
    Tcp { host: String, port: u16 },
    /// Local character device path.
    Device(PathBuf),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Tcp { host, port } => write!(f, "{host}:{port}"),
            Target::Device(path) => write!(f, "{}", path.display()),
        }
    }
}

// Field order matters: the poller is dropped before the descriptor it watches.
struct Live {
    poller: Poller,
    transport: Transport,
}

/// The single connection to the remote console.
///
/// Owns the endpoint and its readiness poller. While disconnected every
/// operation fails fast: `poll` returns false, `send`/`recv` return
/// [`TransportError::NotConnected`].
#[derive(Default)]
pub struct Connection {
    live: Option<Live>,
}

impl Connection {
    /// A connection with no endpoint open.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `target` and register it for read readiness.
    ///
    /// Any endpoint that is already open is closed first.
    pub fn connect(&mut self, target: &Target, retry: &RetryConfig) -> Result<()> {
        self.disconnect();

        let transport = match target {
            Target::Tcp { host, port } => {
                Transport::Socket(connect_with_retry(host, *port, retry)?)
            }
            Target::Device(path) => {
                let (reader, writer) = device::open(path)?;
                Transport::Device {
                    reader,
                    writer,
                    path: path.clone(),
                }
            }
        };

        let poller = Poller::register(transport.read_fd());
        info!(peer = %transport.peer_name(), kind = transport.kind(), "connected");
        self.live = Some(Live { poller, transport });
        Ok(())
    }

    /// Close whatever is open. Calling this while disconnected is a no-op.
    pub fn disconnect(&mut self) {
        if let Some(live) = self.live.take() {
            info!(
                peer = %live.transport.peer_name(),
                kind = live.transport.kind(),
                "closing"
            );
        }
    }

    /// Remote address or device path of the open endpoint.
    pub fn peer_name(&self) -> Option<String> {
        self.live.as_ref().map(|live| live.transport.peer_name())
    }

    /// Borrow the open endpoint.
    pub fn transport(&self) -> Option<&Transport> {
        self.live.as_ref().map(|live| &live.transport)
    }
}

impl Link for Connection {
    fn is_connected(&self) -> bool {
        self.live.is_some()
    }

    fn send(&mut self, data: &[u8]) -> Result<usize> {
        let live = self.live.as_mut().ok_or(TransportError::NotConnected)?;
        Ok(live.transport.send(data)?)
    }

    fn recv(&mut self, max_size: usize) -> Result<Bytes> {
        let live = self.live.as_mut().ok_or(TransportError::NotConnected)?;
        let mut buf = vec![0u8; max_size];
        let read = loop {
            match live.transport.read(&mut buf) {
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                other => break other,
            }
        };

        match read {
            Ok(0) if max_size > 0 => {
                debug!("remote closed the stream");
                self.disconnect();
                Ok(Bytes::new())
            }
            Ok(n) => {
                buf.truncate(n);
                Ok(Bytes::from(buf))
            }
            Err(err) => {
                warn!(error = %err, "read failed, dropping connection");
                self.disconnect();
                Err(err.into())
            }
        }
    }

    fn poll(&mut self, timeout: Duration) -> bool {
        let Some(live) = self.live.as_ref() else {
            return false;
        };
        match live.poller.wait(timeout) {
            Ok(ready) => ready,
            Err(err) => {
                warn!(error = %err, "poll failed");
                false
            }
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("transport", &self.transport())
            .finish()
    }
}
