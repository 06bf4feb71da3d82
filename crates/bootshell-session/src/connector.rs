use std::io::Write;

use bootshell_transport::{Connection, RetryConfig, Target};
use tracing::{info, warn};

use crate::error::Result;
use crate::session::Session;

impl<W: Write> Session<Connection, W> {
    /// Connect to `target` and wait for the remote prompt.
    ///
    /// An open connection is closed first. If the prompt never appears
    /// the new connection is dropped again, so on error the session is
    /// always disconnected.
    pub fn connect(&mut self, target: &Target, retry: &RetryConfig) -> Result<()> {
        self.link_mut().connect(target, retry)?;
        let peer = self.link().peer_name().unwrap_or_else(|| target.to_string());
        info!("connected to {peer}");

        if let Err(err) = self.await_prompt() {
            warn!(remote = %target, error = %err, "remote did not become ready");
            self.disconnect();
            return Err(err);
        }
        Ok(())
    }

    /// Close the connection, if any.
    pub fn disconnect(&mut self) {
        self.link_mut().disconnect();
    }
}
