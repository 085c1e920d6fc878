//! Control-family lookup messages (`CTRL_CMD_GETFAMILY`).

use super::{CtrlAttr, CtrlAttrMcastGrp, CtrlCmd, GENL_ID_CTRL, GenlMsgHdr};
use crate::error::{Error, Result};
use crate::netlink::attr::{AttrIter, Attrs};
use crate::netlink::builder::MessageBuilder;
use crate::netlink::message::{NLM_F_ACK, NLM_F_REQUEST};

/// What the control family reports about one registered family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyInfo {
    /// Family id; the `nlmsg_type` of every message of the family.
    pub id: u16,
    /// Interface version byte.
    pub version: u8,
    /// Multicast groups as `(name, group id)`, in the order the kernel
    /// advertised them.
    pub mcast_groups: Vec<(String, u32)>,
}

impl FamilyInfo {
    pub fn group(&self, name: &str) -> Option<u32> {
        self.mcast_groups
            .iter()
            .find(|(group, _)| group == name)
            .map(|&(_, id)| id)
    }
}

/// Build a `CTRL_CMD_GETFAMILY` request for `name`.
pub fn family_request(name: &str, seq: u32, pid: u32) -> Vec<u8> {
    let mut builder = MessageBuilder::genl(
        GENL_ID_CTRL,
        NLM_F_REQUEST | NLM_F_ACK,
        CtrlCmd::GetFamily as u8,
        1,
    );
    builder
        .attr_str(CtrlAttr::FamilyName as u16, name)
        .seq(seq)
        .port(pid);
    builder.finish()
}

/// Parse the GENL payload of a `CTRL_CMD_NEWFAMILY` reply.
pub fn parse_family(payload: &[u8]) -> Result<FamilyInfo> {
    let (_, data) = GenlMsgHdr::split(payload)?;
    let attrs = Attrs::parse(data, CtrlAttr::McastGroups as u16);

    let id = attrs
        .u16(CtrlAttr::FamilyId as u16)?
        .ok_or_else(|| Error::InvalidMessage("family reply without an id".into()))?;

    let mcast_groups: Vec<(String, u32)> = match attrs.get(CtrlAttr::McastGroups as u16) {
        Some(nest) => AttrIter::new(nest)
            .filter_map(|(_, group)| mcast_group(group).transpose())
            .collect::<Result<_>>()?,
        None => Vec::new(),
    };

    Ok(FamilyInfo {
        id,
        version: attrs.u32(CtrlAttr::Version as u16)?.unwrap_or(0) as u8,
        mcast_groups,
    })
}

/// One group nest; entries missing their name or id are skipped.
fn mcast_group(nest: &[u8]) -> Result<Option<(String, u32)>> {
    let attrs = Attrs::parse(nest, CtrlAttrMcastGrp::Id as u16);
    let name = attrs.string(CtrlAttrMcastGrp::Name as u16)?;
    let id = attrs.u32(CtrlAttrMcastGrp::Id as u16)?;
    Ok(name.zip(id).map(|(name, id)| (name.to_string(), id)))
}
