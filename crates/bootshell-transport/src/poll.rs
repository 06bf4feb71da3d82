use std::io::ErrorKind;
use std::os::fd::RawFd;
use std::time::Duration;

/// Read-readiness poller bound to one descriptor.
///
/// A poller is created for every new endpoint and must not outlive it;
/// [`Connection`](crate::Connection) drops both together.
#[derive(Debug)]
pub struct Poller {
    fd: RawFd,
}

impl Poller {
    /// Register `fd` for read events.
    pub fn register(fd: RawFd) -> Self {
        Self { fd }
    }

    /// Wait up to `timeout` for any event on the registered descriptor.
    ///
    /// Hang-up and error events count as ready so the next read can
    /// observe the closed stream.
    pub fn wait(&self, timeout: Duration) -> std::io::Result<bool> {
        let timeout_ms = timeout_millis(timeout);
        loop {
            let mut pollfd = libc::pollfd {
                fd: self.fd,
                events: libc::POLLIN,
                revents: 0,
            };

            // SAFETY: `pollfd` is a valid, writable pollfd and we pass a count of 1.
            let rc = unsafe { libc::poll(&mut pollfd, 1, timeout_ms) };
            if rc < 0 {
                let err = std::io::Error::last_os_error();
                if err.kind() == ErrorKind::Interrupted {
                    continue;
                }
                return Err(err);
            }
            return Ok(rc > 0 && pollfd.revents != 0);
        }
    }
}

/// `poll(2)` timeout in whole milliseconds, rounded up so a non-zero wait
/// never becomes a non-blocking check.
fn timeout_millis(timeout: Duration) -> libc::c_int {
    let mut millis = timeout.as_millis();
    if timeout.subsec_nanos() % 1_000_000 != 0 {
        millis += 1;
    }
    millis.min(libc::c_int::MAX as u128) as libc::c_int
}
