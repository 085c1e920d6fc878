//! Error types for WiMAX session operations.

use std::io;

use crate::context::Errno;

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the kernel WiMAX stack.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The interface does not exist, or it vanished (e.g. after a
    /// disruptive reset). The session must be discarded.
    #[error("no such device: {device}")]
    NoSuchDevice {
        /// The device name or `#index` that was not found.
        device: String,
    },

    /// The interface does not speak the WiMAX generic netlink protocol, or
    /// a requested channel name is unknown.
    #[error("WiMAX protocol unavailable: {0}")]
    ProtocolUnavailable(String),

    /// Kernel protocol major version differs from the one expected.
    #[error("kernel WiMAX interface version {found} is incompatible with {expected}")]
    VersionMismatch {
        /// Version advertised by the kernel family.
        found: crate::ProtocolVersion,
        /// Version this client was configured for.
        expected: crate::ProtocolVersion,
    },

    /// The channel already has a live receive handle.
    #[error("channel \"{0}\" is already open")]
    AlreadyOpen(String),

    /// A handler asked the receive loop to stop.
    #[error("receive loop stopped by handler")]
    Busy,

    /// Nothing relevant was received.
    #[error("no result yet")]
    InProgress,

    /// Messages arrived but none of them had a handler.
    #[error("no recognized message received")]
    NoData,

    /// The channel id is out of range or not open.
    #[error("channel {0} is not open")]
    BadChannel(usize),

    /// The operation needs a session bound to one device.
    #[error("operation requires a session bound to a device")]
    BadHandle,

    /// A notification lacked a required attribute.
    #[error("malformed message: missing {0}")]
    Malformed(&'static str),

    /// Kernel returned an error code.
    #[error("kernel error: {message} (errno {errno})")]
    Kernel {
        /// The errno value from the kernel.
        errno: i32,
        /// Human-readable error message.
        message: String,
    },

    /// I/O error from socket operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Message was truncated.
    #[error("message truncated: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Expected message length.
        expected: usize,
        /// Actual bytes received.
        actual: usize,
    },

    /// Invalid message format.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Invalid attribute format.
    #[error("invalid attribute: {0}")]
    InvalidAttribute(String),
}

impl Error {
    /// Create a kernel error from a negative errno value.
    pub fn from_errno(errno: i32) -> Self {
        let message = io::Error::from_raw_os_error(-errno).to_string();
        Self::Kernel {
            errno: -errno,
            message,
        }
    }

    /// Negative errno-style code for this error.
    pub fn code(&self) -> Errno {
        let errno = match self {
            Self::NoSuchDevice { .. } => libc::ENODEV,
            Self::ProtocolUnavailable(_) => libc::EPROTONOSUPPORT,
            Self::VersionMismatch { .. } => libc::EBADR,
            Self::AlreadyOpen(_) | Self::Busy => libc::EBUSY,
            Self::InProgress => libc::EINPROGRESS,
            Self::NoData => libc::ENODATA,
            Self::BadChannel(_) => libc::EBADFD,
            Self::BadHandle => libc::EBADF,
            Self::Malformed(_) => libc::ENXIO,
            Self::Kernel { errno, .. } => *errno,
            Self::Io(e) => e.raw_os_error().unwrap_or(libc::EIO),
            Self::Truncated { .. } | Self::InvalidMessage(_) | Self::InvalidAttribute(_) => {
                libc::EINVAL
            }
        };
        Errno(-errno)
    }

    /// Get the errno value if this is a kernel error.
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::Kernel { errno, .. } => Some(*errno),
            _ => None,
        }
    }

    /// Check if the device is gone (missing interface or kernel ENODEV).
    pub fn is_no_such_device(&self) -> bool {
        match self {
            Self::NoSuchDevice { .. } => true,
            Self::Kernel { errno, .. } => *errno == libc::ENODEV,
            _ => false,
        }
    }

    /// Check if waiting again could produce a result.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::InProgress | Self::NoData)
    }
}

impl From<Errno> for Error {
    /// Lift a code recorded by the dispatcher into a full error.
    fn from(code: Errno) -> Self {
        match code {
            Errno::INPROGRESS => Self::InProgress,
            Errno::NODATA => Self::NoData,
            Errno::BUSY => Self::Busy,
            Errno::MALFORMED => Self::Malformed("notification attribute"),
            Errno(errno) => Self::from_errno(errno),
        }
    }
}
