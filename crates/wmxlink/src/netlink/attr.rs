//! Netlink attributes (`struct nlattr` TLVs).

use crate::error::{Error, Result};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

pub const NLA_ALIGNTO: usize = 4;

#[inline]
pub const fn nla_align(len: usize) -> usize {
    (len + NLA_ALIGNTO - 1) & !(NLA_ALIGNTO - 1)
}

pub const NLA_HDRLEN: usize = nla_align(std::mem::size_of::<NlAttr>());

pub const NLA_F_NESTED: u16 = 1 << 15;
pub const NLA_F_NET_BYTEORDER: u16 = 1 << 14;

/// `struct nlattr`; `nla_len` counts the header.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct NlAttr {
    pub nla_len: u16,
    pub nla_type: u16,
}

impl NlAttr {
    pub fn new(kind: u16, data_len: usize) -> Self {
        Self {
            nla_len: (NLA_HDRLEN + data_len) as u16,
            nla_type: kind,
        }
    }

    /// Type with the nested/byte-order flags stripped.
    pub fn kind(&self) -> u16 {
        self.nla_type & !(NLA_F_NESTED | NLA_F_NET_BYTEORDER)
    }

    pub fn as_bytes(&self) -> &[u8] {
        <Self as IntoBytes>::as_bytes(self)
    }

    /// Copy the header out of the front of `data`.
    pub fn read(data: &[u8]) -> Result<Self> {
        Self::read_from_prefix(data)
            .map(|(attr, _)| attr)
            .map_err(|_| Error::Truncated {
                expected: NLA_HDRLEN,
                actual: data.len(),
            })
    }
}

/// Walk over a run of attributes as `(kind, payload)`. Stops at the first
/// attribute whose length does not fit.
pub struct AttrIter<'a> {
    rest: &'a [u8],
}

impl<'a> AttrIter<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { rest: data }
    }
}

impl<'a> Iterator for AttrIter<'a> {
    type Item = (u16, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let attr = NlAttr::read(self.rest).ok()?;
        let len = attr.nla_len as usize;
        if !(NLA_HDRLEN..=self.rest.len()).contains(&len) {
            self.rest = &[];
            return None;
        }

        let payload = &self.rest[NLA_HDRLEN..len];
        self.rest = self.rest.get(nla_align(len)..).unwrap_or(&[]);
        Some((attr.kind(), payload))
    }
}

/// Attributes of one message indexed by type, parsed against a maximum
/// attribute number. Types above the maximum are ignored; a repeated type
/// keeps the last occurrence.
#[derive(Debug, Clone)]
pub struct Attrs<'a> {
    slots: Vec<Option<&'a [u8]>>,
}

impl<'a> Attrs<'a> {
    /// Index the attributes in `data`, accepting types `1..=max_type`.
    pub fn parse(data: &'a [u8], max_type: u16) -> Self {
        let mut slots = vec![None; max_type as usize + 1];
        for (kind, payload) in AttrIter::new(data) {
            if let Some(slot) = slots.get_mut(kind as usize) {
                *slot = Some(payload);
            }
        }
        Self { slots }
    }

    pub fn get(&self, kind: u16) -> Option<&'a [u8]> {
        self.slots.get(kind as usize).copied().flatten()
    }

    pub fn u8(&self, kind: u16) -> Result<Option<u8>> {
        self.get(kind).map(value::as_u8).transpose()
    }

    pub fn u16(&self, kind: u16) -> Result<Option<u16>> {
        self.get(kind).map(value::as_u16).transpose()
    }

    pub fn u32(&self, kind: u16) -> Result<Option<u32>> {
        self.get(kind).map(value::as_u32).transpose()
    }

    pub fn string(&self, kind: u16) -> Result<Option<&'a str>> {
        self.get(kind).map(value::as_str).transpose()
    }
}

/// Typed views of attribute payloads. Integers are host byte order.
pub mod value {
    use crate::error::{Error, Result};

    fn array<const N: usize>(data: &[u8]) -> Result<[u8; N]> {
        data.get(..N)
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or_else(|| {
                Error::InvalidAttribute(format!("{} byte payload, need {}", data.len(), N))
            })
    }

    pub fn as_u8(data: &[u8]) -> Result<u8> {
        array::<1>(data).map(|[b]| b)
    }

    pub fn as_u16(data: &[u8]) -> Result<u16> {
        array(data).map(u16::from_ne_bytes)
    }

    pub fn as_u32(data: &[u8]) -> Result<u32> {
        array(data).map(u32::from_ne_bytes)
    }

    /// String up to the first NUL, or the whole payload if there is none.
    pub fn as_str(data: &[u8]) -> Result<&str> {
        let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
        std::str::from_utf8(&data[..end])
            .map_err(|e| Error::InvalidAttribute(format!("string is not UTF-8: {}", e)))
    }
}
