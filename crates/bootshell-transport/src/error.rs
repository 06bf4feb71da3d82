/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open or connect to the target.
    #[error("failed to connect to {target}: {source}")]
    Connect {
        target: String,
        source: std::io::Error,
    },

    /// The retry budget was exhausted without the target accepting.
    #[error("timed out connecting to {target} after {attempts} attempts")]
    ConnectTimeout { target: String, attempts: u32 },

    /// An I/O error occurred on the transport stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection has been torn down.
    #[error("not connected")]
    NotConnected,
}

pub type Result<T> = std::result::Result<T, TransportError>;
