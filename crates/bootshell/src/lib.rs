//! Interactive control shell for a bootrom console.
//!
//! bootshell talks to a bootrom (or an emulator standing in for one) over a
//! TCP stream or a local character device, runs its console commands and
//! uploads binaries and ELF images into remote memory.
//!
//! # Crate Structure
//!
//! - [`transport`]: connection to the remote console (TCP or device)
//! - [`frame`]: sync-marker framing of the console byte stream
//! - [`session`]: commands, chunked uploads and ELF loading

/// Re-export transport types.
pub mod transport {
    pub use bootshell_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use bootshell_frame::*;
}

/// Re-export session types.
pub mod session {
    pub use bootshell_session::*;
}
