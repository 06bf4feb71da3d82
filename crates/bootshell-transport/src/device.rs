use std::fs::{File, OpenOptions};
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

use tracing::debug;

use crate::error::{Result, TransportError};

/// Open a character device as separate, unbuffered read and write handles.
///
/// There is no reachability check: a device that opens is considered
/// connected.
pub fn open(path: impl AsRef<Path>) -> Result<(File, File)> {
    let path = path.as_ref();
    let connect_err = |source| TransportError::Connect {
        target: path.display().to_string(),
        source,
    };

    let reader = OpenOptions::new()
        .read(true)
        .custom_flags(libc::O_NOCTTY)
        .open(path)
        .map_err(connect_err)?;
    let writer = OpenOptions::new()
        .write(true)
        .custom_flags(libc::O_NOCTTY)
        .open(path)
        .map_err(connect_err)?;

    debug!(?path, "opened device");
    Ok((reader, writer))
}
