//! Sync-marker framing over a bootrom console byte stream.
//!
//! The remote terminates every logical packet with a single ETX byte
//! (`0x03`). There are no lengths and no message IDs: a request is matched
//! to its response purely by ordering, so callers must keep dispatch
//! strictly serialized.
//!
//! [`SyncFramer`] provides the three blocking receive modes built on top
//! of a [`Link`](bootshell_transport::Link):
//! - [`wait_for_sync`](SyncFramer::wait_for_sync): echo output until a read contains the marker
//! - [`wait_for_response`](SyncFramer::wait_for_response): collect a short reply up to the marker
//! - [`wait_for_idle`](SyncFramer::wait_for_idle): drain output until the line goes quiet

pub mod error;
pub mod framer;
pub mod sync;

pub use error::{FrameError, Result};
pub use framer::{FramerConfig, Scan, SyncFramer};
pub use sync::{contains_sync, echo_payload, READ_CHUNK_SIZE, SYNC};
