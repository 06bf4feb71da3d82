use std::io::Write;

use bootshell_frame::FrameError;
use bootshell_transport::Link;
use tracing::{debug, info};

use crate::error::{Result, SessionError};
use crate::session::Session;

impl<L: Link, W: Write> Session<L, W> {
    /// Wait for the remote command prompt, then switch its echo off.
    ///
    /// Sends a bare newline up to `prompt_attempts` times and waits
    /// `prompt_timeout` after each one for a sync marker. Once the prompt
    /// shows up, `echo off` is sent and its acknowledgement drained
    /// without echoing it.
    pub fn await_prompt(&mut self) -> Result<()> {
        self.ensure_connected()?;
        let attempts = self.config().prompt_attempts;
        let timeout = self.config().prompt_timeout;

        for attempt in 1..=attempts {
            self.framer_mut().send(b"\n")?;
            match self.framer_mut().wait_for_sync(timeout, true) {
                Ok(()) => {
                    info!(attempt, "remote prompt ready");
                    self.framer_mut().send_line("echo off")?;
                    let idle = self.config().idle_timeout;
                    self.framer_mut().wait_for_idle(idle, false);
                    return Ok(());
                }
                Err(FrameError::Timeout(_)) => {
                    debug!(attempt, "no prompt yet");
                }
                Err(err) => {
                    debug!(attempt, error = %err, "lost link while waiting for prompt");
                    return Err(SessionError::NoPrompt { attempts: attempt });
                }
            }
        }

        Err(SessionError::NoPrompt { attempts })
    }
}
