//! WiMAX generic netlink protocol constants.

use crate::types::ProtocolVersion;

/// Family name prefix; the kernel registers `"WiMAX <ifindex>"` or `"WiMAX"`.
pub const FAMILY_PREFIX: &str = "WiMAX";

/// Interface version this client speaks (0.1).
pub const GNL_VERSION: ProtocolVersion = ProtocolVersion::new(0, 1);

/// Name of the mandatory default multicast group.
pub const DEFAULT_CHANNEL: &str = "msg";

/// Maximum number of multicast groups tracked per session.
pub const MAX_CHANNELS: usize = 5;

/// Maximum channel name length, including the terminator.
pub const MAX_CHANNEL_NAME: usize = 32;

/// WiMAX generic netlink commands.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WimaxCmd {
    MsgFromUser = 0,
    MsgToUser = 1,
    RfKill = 2,
    Reset = 3,
    ReStateChange = 4,
    StateGet = 5,
}

impl WimaxCmd {
    pub fn from_u8(cmd: u8) -> Option<Self> {
        Some(match cmd {
            0 => Self::MsgFromUser,
            1 => Self::MsgToUser,
            2 => Self::RfKill,
            3 => Self::Reset,
            4 => Self::ReStateChange,
            5 => Self::StateGet,
            _ => return None,
        })
    }
}

/// Attributes of `MSG_FROM_USER` / `MSG_TO_USER`.
pub mod msg_attr {
    pub const IFIDX: u16 = 1;
    pub const PIPE_NAME: u16 = 2;
    pub const DATA: u16 = 3;
    pub const MAX: u16 = 3;
}

/// Attributes of `RFKILL`.
pub mod rfkill_attr {
    pub const IFIDX: u16 = 1;
    pub const STATE: u16 = 2;
}

/// Attributes of `RESET`.
pub mod reset_attr {
    pub const IFIDX: u16 = 1;
}

/// Attributes of `STATE_GET`.
pub mod state_get_attr {
    pub const IFIDX: u16 = 1;
}

/// Attributes of `RE_STATE_CHANGE`.
pub mod state_change_attr {
    pub const IFIDX: u16 = 1;
    pub const STATE_OLD: u16 = 2;
    pub const STATE_NEW: u16 = 3;
    pub const MAX: u16 = 3;
}
