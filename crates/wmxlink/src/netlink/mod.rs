//! Netlink and generic netlink wire handling.

pub mod attr;
pub mod builder;
pub mod genl;
pub mod message;
pub mod socket;

pub use builder::MessageBuilder;
pub use message::{MessageIter, NlMsgError, NlMsgHdr};
pub use socket::NetlinkSocket;
