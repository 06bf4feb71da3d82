use std::path::PathBuf;

use bootshell_frame::FrameError;
use bootshell_transport::TransportError;

/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No connection is open.
    #[error("not connected")]
    NotConnected,

    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// A chunk was not acknowledged in time and the upload was abandoned.
    #[error("upload stalled at {address:#x}: {source}")]
    UploadTimeout { address: u64, source: FrameError },

    /// The remote never presented its command prompt.
    #[error("no command prompt from remote after {attempts} attempts")]
    NoPrompt { attempts: u32 },

    /// A local file could not be read.
    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A file could not be parsed as an ELF image.
    #[error("invalid ELF image: {0}")]
    Elf(#[from] ::elf::ParseError),
}

impl SessionError {
    /// Whether the error came from a protocol timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            SessionError::Frame(err) => err.is_timeout(),
            SessionError::UploadTimeout { .. } | SessionError::NoPrompt { .. } => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
