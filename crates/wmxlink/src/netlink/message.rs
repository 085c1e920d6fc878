//! Netlink framing: the `nlmsghdr` view and a walk over the frames packed
//! into one datagram.

use crate::error::{Error, Result};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

pub const NLMSG_ALIGNTO: usize = 4;

#[inline]
pub const fn nlmsg_align(len: usize) -> usize {
    (len + NLMSG_ALIGNTO - 1) & !(NLMSG_ALIGNTO - 1)
}

pub const NLMSG_HDRLEN: usize = nlmsg_align(std::mem::size_of::<NlMsgHdr>());

// Reserved frame types; protocol families start at 0x10.
pub const NLMSG_NOOP: u16 = 1;
pub const NLMSG_ERROR: u16 = 2;
pub const NLMSG_DONE: u16 = 3;
pub const NLMSG_OVERRUN: u16 = 4;

pub const NLM_F_REQUEST: u16 = 0x01;
pub const NLM_F_ACK: u16 = 0x04;

/// `struct nlmsghdr`. For generic netlink `nlmsg_type` is the family id.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct NlMsgHdr {
    pub nlmsg_len: u32,
    pub nlmsg_type: u16,
    pub nlmsg_flags: u16,
    pub nlmsg_seq: u32,
    pub nlmsg_pid: u32,
}

impl NlMsgHdr {
    /// Header of an empty frame; the builder patches the length.
    pub fn new(msg_type: u16, flags: u16) -> Self {
        Self {
            nlmsg_len: NLMSG_HDRLEN as u32,
            nlmsg_type: msg_type,
            nlmsg_flags: flags,
            ..Self::default()
        }
    }

    /// ACK or error report.
    pub fn is_error(&self) -> bool {
        self.nlmsg_type == NLMSG_ERROR
    }

    pub fn is_done(&self) -> bool {
        self.nlmsg_type == NLMSG_DONE
    }

    /// NOOP and OVERRUN frames carry nothing for the caller.
    pub fn is_control(&self) -> bool {
        matches!(self.nlmsg_type, NLMSG_NOOP | NLMSG_OVERRUN)
    }

    pub fn as_bytes(&self) -> &[u8] {
        <Self as IntoBytes>::as_bytes(self)
    }

    /// Copy the header out of the front of `data`.
    pub fn read(data: &[u8]) -> Result<Self> {
        read_prefix(data)
    }
}

/// `struct nlmsgerr`, the payload of an `NLMSG_ERROR` frame.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, Immutable, KnownLayout)]
pub struct NlMsgError {
    /// Negative errno, zero for a plain ACK, or a positive value the kernel
    /// handler returned through the ACK.
    pub error: i32,
    /// Header of the request being answered.
    pub msg: NlMsgHdr,
}

impl NlMsgError {
    pub fn read(payload: &[u8]) -> Result<Self> {
        read_prefix(payload)
    }

    /// Not an error report.
    pub fn is_ack(&self) -> bool {
        self.error >= 0
    }
}

/// Copy a `T` out of the front of `data`, whatever its alignment.
fn read_prefix<T: FromBytes>(data: &[u8]) -> Result<T> {
    T::read_from_prefix(data)
        .map(|(value, _)| value)
        .map_err(|_| Error::Truncated {
            expected: std::mem::size_of::<T>(),
            actual: data.len(),
        })
}

/// The frames of one datagram, in order, as `(header, payload)`.
///
/// A frame whose length does not fit the datagram is reported once and
/// ends the walk.
pub struct MessageIter<'a> {
    rest: &'a [u8],
}

impl<'a> MessageIter<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { rest: data }
    }
}

impl<'a> Iterator for MessageIter<'a> {
    type Item = Result<(NlMsgHdr, &'a [u8])>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.len() < NLMSG_HDRLEN {
            return None;
        }

        let header = match NlMsgHdr::read(self.rest) {
            Ok(header) => header,
            Err(e) => {
                self.rest = &[];
                return Some(Err(e));
            }
        };
        let len = header.nlmsg_len as usize;
        if !(NLMSG_HDRLEN..=self.rest.len()).contains(&len) {
            self.rest = &[];
            return Some(Err(Error::InvalidMessage(format!(
                "frame length {} outside {}..={}",
                len,
                NLMSG_HDRLEN,
                self.rest.len()
            ))));
        }

        let payload = &self.rest[NLMSG_HDRLEN..len];
        self.rest = self.rest.get(nlmsg_align(len)..).unwrap_or(&[]);
        Some(Ok((header, payload)))
    }
}
