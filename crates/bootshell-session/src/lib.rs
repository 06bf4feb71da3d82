//! Command channel, chunked uploads and ELF loading for a bootrom console.
//!
//! This is the layer the shell talks to. A [`Session`] owns the framed
//! link and runs one remote operation at a time: commands, blob uploads in
//! fixed 64 KiB strides, and ELF images split into their loadable
//! segments.

pub mod config;
#[cfg(unix)]
pub mod connector;
pub mod error;
pub mod handshake;
pub mod loader;
pub mod session;
pub mod upload;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::{SessionConfig, TimeoutPolicy};
pub use error::{Result, SessionError};
pub use loader::{ElfImage, Segment};
pub use session::{Session, SMC_BOOT_REGISTER};
pub use upload::{chunks, Chunk, UploadReport, CHUNK_SIZE, XFLASH_BASE};
