//! First-result-wins correlation between a blocking caller and the
//! dispatcher.

use std::fmt;

/// Negative errno-style code, as carried in netlink ACKs.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Errno(pub i32);

impl Errno {
    /// No definitive result yet.
    pub const INPROGRESS: Errno = Errno(-libc::EINPROGRESS);
    /// Messages arrived, none of them recognized.
    pub const NODATA: Errno = Errno(-libc::ENODATA);
    /// Handler stop signal.
    pub const BUSY: Errno = Errno(-libc::EBUSY);
    /// A notification lacked a required attribute.
    pub const MALFORMED: Errno = Errno(-libc::ENXIO);
    /// Message addressed to another interface.
    pub const NODEV: Errno = Errno(-libc::ENODEV);
}

impl fmt::Debug for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Errno({})", self.0)
    }
}

impl fmt::Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", std::io::Error::from_raw_os_error(-self.0))
    }
}

/// A handler or exchange outcome: a non-negative value or an error code.
pub type Outcome = Result<usize, Errno>;

/// Per-call correlation context.
///
/// The result starts out as `InProgress` and changes at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallbackContext {
    result: Outcome,
    done: bool,
}

impl CallbackContext {
    /// A fresh context with no result.
    pub fn new() -> Self {
        Self {
            result: Err(Errno::INPROGRESS),
            done: false,
        }
    }

    /// Record `value` if no result has been recorded yet.
    ///
    /// Returns `true` if the value was stored.
    pub fn maybe_set(&mut self, value: Outcome) -> bool {
        if self.is_pending() {
            self.result = value;
            true
        } else {
            false
        }
    }

    /// Mark the exchange closed (ACK or stop seen).
    pub fn mark_done(&mut self) {
        self.done = true;
    }

    /// Whether the exchange has been closed.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Whether the result is still `InProgress`.
    pub fn is_pending(&self) -> bool {
        self.result == Err(Errno::INPROGRESS)
    }

    pub fn result(&self) -> Outcome {
        self.result
    }
}

impl Default for CallbackContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_in_progress() {
        let ctx = CallbackContext::new();
        assert!(ctx.is_pending());
        assert!(!ctx.is_done());
        assert_eq!(ctx.result(), Err(Errno::INPROGRESS));
    }

    #[test]
    fn test_first_value_wins() {
        let mut ctx = CallbackContext::new();
        assert!(ctx.maybe_set(Err(Errno(-libc::EIO))));
        assert!(!ctx.maybe_set(Ok(0)));
        assert!(!ctx.maybe_set(Err(Errno::NODATA)));
        assert!(!ctx.maybe_set(Ok(12)));
        assert_eq!(ctx.result(), Err(Errno(-libc::EIO)));
    }

    #[test]
    fn test_any_sequence_keeps_first_commit() {
        let sequences: [&[Outcome]; 4] = [
            &[Ok(3), Ok(0), Err(Errno::BUSY)],
            &[Err(Errno::NODATA), Ok(7)],
            &[Ok(0)],
            &[Err(Errno(-libc::EPERM)), Err(Errno(-libc::EPERM)), Ok(1)],
        ];
        for seq in sequences {
            let mut ctx = CallbackContext::new();
            for &value in seq {
                ctx.maybe_set(value);
            }
            assert_eq!(ctx.result(), seq[0]);
        }
    }

    #[test]
    fn test_setting_in_progress_keeps_pending() {
        let mut ctx = CallbackContext::new();
        ctx.maybe_set(Err(Errno::INPROGRESS));
        assert!(ctx.is_pending());
        ctx.maybe_set(Ok(5));
        assert_eq!(ctx.result(), Ok(5));
    }

    #[test]
    fn test_done_is_independent_of_result() {
        let mut ctx = CallbackContext::new();
        ctx.mark_done();
        assert!(ctx.is_done());
        assert!(ctx.is_pending());
    }
}
