use std::io::{Stdout, Write};

use bootshell_frame::SyncFramer;
use bootshell_transport::Link;
use tracing::debug;

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};

/// Register poked to start (or, with entry 0, stop) the SMC core.
pub const SMC_BOOT_REGISTER: u64 = 0x5402_0000;

/// A command channel to the remote bootrom.
///
/// Requests and responses are correlated only by ordering, so a session
/// runs exactly one remote operation at a time and every method blocks
/// until that operation's terminating condition.
pub struct Session<L, W = Stdout> {
    framer: SyncFramer<L, W>,
    config: SessionConfig,
}

impl<L: Link> Session<L> {
    /// Create a session that echoes remote output to stdout.
    pub fn new(link: L, config: SessionConfig) -> Self {
        Self {
            framer: SyncFramer::new(link),
            config,
        }
    }
}

impl<L: Link, W: Write> Session<L, W> {
    /// Create a session with an explicit echo sink.
    pub fn with_echo(link: L, echo: W, config: SessionConfig) -> Self {
        Self {
            framer: SyncFramer::with_echo(link, echo),
            config,
        }
    }

    /// Send `line` and echo the remote output until its sync marker.
    pub fn run_command(&mut self, line: &str) -> Result<()> {
        self.ensure_connected()?;
        self.framer.send_line(line)?;
        self.framer.wait_for_sync(self.config.command_timeout, true)?;
        Ok(())
    }

    /// Start an application on the secure core at `entry`.
    ///
    /// The remote console stops answering once the application runs, so
    /// this drains output until the line goes quiet instead of waiting for
    /// a sync marker. Returns the number of bytes drained.
    pub fn boot_sec(&mut self, entry: &str) -> Result<usize> {
        self.ensure_connected()?;
        self.framer.send_line(&format!("boot {entry}"))?;
        Ok(self.framer.wait_for_idle(self.config.idle_timeout, true))
    }

    /// Start the SMC core at `entry`; entry 0 stops it.
    pub fn boot_smc(&mut self, entry: &str) -> Result<usize> {
        self.ensure_connected()?;
        self.framer
            .send_line(&format!("poked {SMC_BOOT_REGISTER:#x} {entry}"))?;
        Ok(self.framer.wait_for_idle(self.config.idle_timeout, true))
    }

    /// Ask the remote for its own command list.
    pub fn remote_help(&mut self) -> Result<()> {
        self.run_command("help")
    }

    /// Whether the link is connected.
    pub fn is_connected(&self) -> bool {
        self.framer.is_connected()
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Replace the session configuration.
    pub fn set_config(&mut self, config: SessionConfig) {
        self.config = config;
    }

    /// Borrow the framer.
    pub fn framer(&self) -> &SyncFramer<L, W> {
        &self.framer
    }

    /// Mutably borrow the framer.
    pub fn framer_mut(&mut self) -> &mut SyncFramer<L, W> {
        &mut self.framer
    }

    /// Borrow the underlying link.
    pub fn link(&self) -> &L {
        self.framer.get_ref()
    }

    /// Mutably borrow the underlying link.
    pub fn link_mut(&mut self) -> &mut L {
        self.framer.get_mut()
    }

    pub(crate) fn ensure_connected(&self) -> Result<()> {
        if self.is_connected() {
            Ok(())
        } else {
            debug!("operation rejected: not connected");
            Err(SessionError::NotConnected)
        }
    }
}
