use std::time::Duration;

use crate::upload::CHUNK_SIZE;

/// What an upload does when a chunk is not acknowledged in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeoutPolicy {
    /// Stop the upload and report the address that stalled.
    #[default]
    Abort,
    /// Log the timeout and move on to the next chunk.
    ///
    /// The remote and the local address cursor can drift apart if a chunk
    /// is lost; nothing is resent.
    Continue,
}

/// Timeouts and transfer parameters for a session.
///
/// All timeouts apply to a single poll, not to a whole operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// How long a command may stay silent before its sync marker.
    pub command_timeout: Duration,
    /// How long to wait for the reply to a `write` command.
    pub response_timeout: Duration,
    /// Per-ping wait while looking for the remote prompt.
    pub prompt_timeout: Duration,
    /// Number of pings sent while looking for the remote prompt.
    pub prompt_attempts: u32,
    /// Quiet period that ends an idle drain.
    pub idle_timeout: Duration,
    /// Upload chunk size, which is also the address stride.
    pub chunk_size: usize,
    /// Behavior on a timeout in the middle of an upload.
    pub timeout_policy: TimeoutPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            command_timeout: Duration::from_secs(100),
            response_timeout: Duration::from_secs(100),
            prompt_timeout: Duration::from_secs(1),
            prompt_attempts: 180,
            idle_timeout: Duration::from_millis(100),
            chunk_size: CHUNK_SIZE,
            timeout_policy: TimeoutPolicy::Abort,
        }
    }
}
