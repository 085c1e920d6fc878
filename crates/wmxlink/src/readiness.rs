//! Await channel readability from a tokio task.
//!
//! The session API is blocking. To drive it from an async runtime, wait for
//! a channel descriptor to become readable and then call the single-shot
//! [`Session::read_channel`](crate::Session::read_channel), which will not
//! block.
//!
//! ```rust,no_run
//! use wmxlink::{ChannelId, ChannelReadiness, Device, Session};
//!
//! # async fn example() -> wmxlink::Result<()> {
//! let mut session = Session::connect(Device::parse("wmx0"))?;
//! let ready = ChannelReadiness::new(session.recv_fd()?)?;
//! loop {
//!     ready.readable().await?;
//!     match session.read_channel(ChannelId::DEFAULT) {
//!         Ok(_) => {}
//!         Err(e) if e.is_retryable() => continue,
//!         Err(e) => return Err(e),
//!     }
//! }
//! # }
//! ```

use std::os::unix::io::{AsRawFd, RawFd};

use tokio::io::unix::AsyncFd;

use crate::error::Result;

/// Borrowed descriptor; the channel keeps ownership and closes it.
struct Fd(RawFd);

impl AsRawFd for Fd {
    fn as_raw_fd(&self) -> RawFd {
        self.0
    }
}

/// Readiness watcher for one channel descriptor.
///
/// Must be dropped before the channel it watches is closed.
pub struct ChannelReadiness {
    inner: AsyncFd<Fd>,
}

impl ChannelReadiness {
    /// Register `fd` with the current tokio reactor.
    pub fn new(fd: RawFd) -> Result<Self> {
        Ok(Self {
            inner: AsyncFd::new(Fd(fd))?,
        })
    }

    /// Wait until a datagram is queued on the descriptor.
    pub async fn readable(&self) -> Result<()> {
        loop {
            let mut guard = self.inner.readable().await?;
            if has_input(self.inner.get_ref().0)? {
                return Ok(());
            }
            // Stale readiness: the datagram was consumed by an earlier read.
            guard.clear_ready();
        }
    }
}

/// Non-blocking check for queued input.
fn has_input(fd: RawFd) -> Result<bool> {
    let mut pfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    // SAFETY: pfd is a valid pollfd for the duration of the call and the
    // count matches; a zero timeout never blocks.
    let ret = unsafe { libc::poll(&mut pfd, 1, 0) };
    if ret < 0 {
        return Err(std::io::Error::last_os_error().into());
    }
    Ok(ret > 0 && pfd.revents & libc::POLLIN != 0)
}
