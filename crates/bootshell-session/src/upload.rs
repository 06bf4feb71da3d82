use std::io::Write;
use std::ops::AddAssign;
use std::path::Path;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use bootshell_frame::FrameError;
use bootshell_transport::Link;
use tracing::{debug, info, warn};

use crate::config::TimeoutPolicy;
use crate::error::{Result, SessionError};
use crate::session::Session;

/// Upload chunk size and address stride: 64 KiB.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Base address of the external flash window.
pub const XFLASH_BASE: u64 = 0x4400_0000;

/// One slice of an upload and where it lands on the remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    pub address: u64,
    pub data: &'a [u8],
}

impl Chunk<'_> {
    /// The command line that announces this chunk.
    pub fn command(&self) -> String {
        format!("write {:#x}", self.address)
    }

    /// The chunk bytes as a base64 line body.
    pub fn encode(&self) -> String {
        BASE64.encode(self.data)
    }
}

/// Split `blob` into chunks of at most `stride` bytes.
///
/// The k-th chunk lands at `start + k * stride`, even when the last chunk
/// is shorter than the stride. An empty blob yields no chunks.
pub fn chunks(blob: &[u8], start: u64, stride: usize) -> impl Iterator<Item = Chunk<'_>> {
    let stride = stride.max(1);
    blob.chunks(stride).enumerate().map(move |(index, data)| Chunk {
        address: start.wrapping_add((index as u64).wrapping_mul(stride as u64)),
        data,
    })
}

/// Totals for a finished upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadReport {
    /// Chunks sent.
    pub chunks: usize,
    /// Payload bytes sent, before encoding.
    pub bytes: usize,
    /// Timeouts tolerated under [`TimeoutPolicy::Continue`].
    pub timeouts: usize,
}

impl AddAssign for UploadReport {
    fn add_assign(&mut self, other: Self) {
        self.chunks += other.chunks;
        self.bytes += other.bytes;
        self.timeouts += other.timeouts;
    }
}

impl<L: Link, W: Write> Session<L, W> {
    /// Upload `blob` to the remote starting at `address`.
    ///
    /// Each chunk is announced with `write <address>`, its short reply is
    /// discarded, then the base64-encoded bytes are sent and the remote's
    /// sync marker awaited before the next chunk goes out.
    pub fn load_blob_at(&mut self, blob: &[u8], address: u64) -> Result<UploadReport> {
        self.ensure_connected()?;
        let stride = self.config().chunk_size;
        let mut report = UploadReport::default();

        for chunk in chunks(blob, address, stride) {
            debug!(
                address = %format_args!("{:#x}", chunk.address),
                len = chunk.data.len(),
                "writing chunk"
            );

            self.framer_mut().send_line(&chunk.command())?;
            let timeout = self.config().response_timeout;
            let ack = self.framer_mut().wait_for_response(timeout).map(drop);
            self.settle(chunk.address, ack, &mut report)?;

            self.framer_mut().send_line(&chunk.encode())?;
            let timeout = self.config().command_timeout;
            let done = self.framer_mut().wait_for_sync(timeout, true);
            self.settle(chunk.address, done, &mut report)?;

            report.chunks += 1;
            report.bytes += chunk.data.len();
        }

        Ok(report)
    }

    /// Read `path` fully and upload it to `address`.
    pub fn load_file_at(&mut self, path: impl AsRef<Path>, address: u64) -> Result<UploadReport> {
        let path = path.as_ref();
        let blob = std::fs::read(path).map_err(|source| SessionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(
            ?path,
            len = blob.len(),
            address = %format_args!("{address:#x}"),
            "uploading file"
        );
        self.load_blob_at(&blob, address)
    }

    /// Upload `path` into the external flash window.
    pub fn load_xflash(&mut self, path: impl AsRef<Path>) -> Result<UploadReport> {
        self.load_file_at(path, XFLASH_BASE)
    }

    fn settle(
        &self,
        address: u64,
        outcome: bootshell_frame::Result<()>,
        report: &mut UploadReport,
    ) -> Result<()> {
        match outcome {
            Ok(()) => Ok(()),
            Err(err @ FrameError::Timeout(_)) => match self.config().timeout_policy {
                TimeoutPolicy::Continue => {
                    warn!(
                        address = %format_args!("{address:#x}"),
                        error = %err,
                        "chunk not acknowledged, continuing"
                    );
                    report.timeouts += 1;
                    Ok(())
                }
                TimeoutPolicy::Abort => Err(SessionError::UploadTimeout {
                    address,
                    source: err,
                }),
            },
            Err(err) => Err(err.into()),
        }
    }
}
