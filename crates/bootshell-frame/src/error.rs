use std::time::Duration;

use bootshell_transport::TransportError;

/// Errors that can occur while waiting on framed traffic.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A single poll elapsed without the stream becoming readable.
    #[error("no data from remote within {0:?}")]
    Timeout(Duration),

    /// The connection is closed, or closed while waiting.
    #[error("connection closed")]
    Disconnected,

    /// The transport failed underneath the framer.
    #[error("transport error: {0}")]
    Transport(TransportError),
}

impl From<TransportError> for FrameError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::NotConnected => FrameError::Disconnected,
            other => FrameError::Transport(other),
        }
    }
}

impl FrameError {
    /// Whether this is a poll timeout rather than a lost connection.
    pub fn is_timeout(&self) -> bool {
        matches!(self, FrameError::Timeout(_))
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
