//! Generic netlink: the GENL header and the control family that maps
//! family names to the ids and multicast groups the kernel assigned.

mod family;
mod header;

pub use family::{FamilyInfo, family_request, parse_family};
pub use header::{GENL_HDRLEN, GenlMsgHdr};

/// The control family has the one fixed id.
pub const GENL_ID_CTRL: u16 = 0x10;

/// `CTRL_CMD_*` used for family lookup.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtrlCmd {
    NewFamily = 1,
    GetFamily = 3,
}

/// `CTRL_ATTR_*` of a family description.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtrlAttr {
    FamilyId = 1,
    FamilyName = 2,
    Version = 3,
    HdrSize = 4,
    MaxAttr = 5,
    McastGroups = 7,
}

/// `CTRL_ATTR_MCAST_GRP_*` inside each multicast group nest.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtrlAttrMcastGrp {
    Name = 1,
    Id = 2,
}
