//! Byte-stream transport to a remote bootrom console.
//!
//! Provides a single connection abstraction over two endpoint kinds:
//! - TCP sockets (e.g. an emulator exposing its UART on a port)
//! - Local character devices (e.g. a pty or serial device node)
//!
//! This is the lowest layer of bootshell. Everything else builds on the
//! [`Link`] trait implemented by [`Connection`].

pub mod error;
pub mod traits;

#[cfg(unix)]
pub mod connection;
#[cfg(unix)]
pub mod device;
#[cfg(unix)]
pub mod poll;
#[cfg(unix)]
pub mod tcp;
#[cfg(unix)]
pub mod transport;

pub use error::{Result, TransportError};
pub use traits::Link;

#[cfg(unix)]
pub use connection::{Connection, Target};
#[cfg(unix)]
pub use poll::Poller;
#[cfg(unix)]
pub use tcp::RetryConfig;
#[cfg(unix)]
pub use transport::Transport;
