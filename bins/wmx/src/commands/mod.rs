//! Subcommand implementations.

pub mod device;
pub mod monitor;
pub mod msg;
pub mod rfkill;

use wmxlink::{NetlinkTransport, Session};

/// Session type every subcommand runs against.
pub type WmxSession = Session<NetlinkTransport>;
