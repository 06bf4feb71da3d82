//! The sync marker and byte-level helpers.

use std::io::Write;

/// ASCII ETX, the packet terminator emitted by the remote.
pub const SYNC: u8 = 0x03;

/// Upper bound for a single read while echoing output.
pub const READ_CHUNK_SIZE: usize = 4096;

/// Returns true if `data` contains at least one sync marker.
pub fn contains_sync(data: &[u8]) -> bool {
    data.contains(&SYNC)
}

/// Write every non-marker byte of `data` to `sink`, in order.
///
/// Bytes after a marker are written too; the marker only delimits.
pub fn echo_payload<W: Write + ?Sized>(data: &[u8], sink: &mut W) -> std::io::Result<()> {
    for part in data.split(|byte| *byte == SYNC) {
        sink.write_all(part)?;
    }
    sink.flush()
}
