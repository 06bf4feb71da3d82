use std::io::ErrorKind;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};

/// Bounded retry loop for TCP connects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of connect attempts.
    pub attempts: u32,
    /// Delay between failed attempts.
    pub interval: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 60,
            interval: Duration::from_secs(1),
        }
    }
}

/// Connect to `host:port`, retrying while the remote is not accepting yet.
///
/// Refused, reset, aborted and timed-out attempts are retried up to
/// `retry.attempts` times. Any other failure (including name resolution)
/// is returned immediately.
pub fn connect_with_retry(host: &str, port: u16, retry: &RetryConfig) -> Result<TcpStream> {
    let target = format!("{host}:{port}");
    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|source| TransportError::Connect {
            target: target.clone(),
            source,
        })?
        .collect();

    info!(%target, attempts = retry.attempts, "connecting");
    for attempt in 1..=retry.attempts {
        match TcpStream::connect(&addrs[..]) {
            Ok(stream) => {
                debug!(%target, attempt, "connected");
                return Ok(stream);
            }
            Err(err) if is_retryable(err.kind()) => {
                debug!(%target, attempt, error = %err, "connect attempt failed");
                if attempt < retry.attempts {
                    std::thread::sleep(retry.interval);
                }
            }
            Err(source) => return Err(TransportError::Connect { target, source }),
        }
    }

    Err(TransportError::ConnectTimeout {
        target,
        attempts: retry.attempts,
    })
}

fn is_retryable(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::ConnectionRefused
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::TimedOut
    )
}
