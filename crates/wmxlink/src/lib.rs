//! WiMAX control-plane client over generic netlink.
//!
//! The kernel WiMAX stack registers a generic netlink family per device
//! (`"WiMAX <ifindex>"`, or a shared `"WiMAX"` family) with a mandatory
//! `"msg"` multicast group plus a few driver-defined ones. This crate
//! resolves that family, keeps the group table, dispatches incoming
//! notifications to per-session handlers and offers blocking wrappers for
//! the device commands.
//!
//! # Example
//!
//! ```rust,no_run
//! use wmxlink::{Device, PipeFilter, RfKillState, Session};
//!
//! # fn example() -> wmxlink::Result<()> {
//! let mut session = Session::connect(Device::parse("wmx0"))?;
//!
//! // Turn the radio on and check the software switch followed.
//! let status = session.rfkill(RfKillState::On)?;
//! assert!(status.software_on());
//!
//! // Wait for the device to move.
//! let (old, new) = session.wait_for_state_change()?;
//! println!("{} -> {}", old, new);
//!
//! // Exchange an opaque message with the driver.
//! session.msg_write(None, b"\x01\x02")?;
//! let reply = session.msg_read(PipeFilter::Default)?;
//! println!("{} bytes", reply.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - `async`: [`ChannelReadiness`], awaiting channel readability on tokio.
//! - `serde`: `Serialize` for the value types.

mod channel;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod log;
pub mod netlink;
pub mod resolve;
pub mod session;
pub mod transport;
pub mod types;
pub mod util;
pub mod wimax;

#[cfg(feature = "async")]
pub mod readiness;

pub use config::SessionConfig;
pub use context::{CallbackContext, Errno, Outcome};
pub use dispatch::{Action, MsgToUser, MsgToUserFn, StateChange, StateChangeFn};
pub use error::{Error, Result};
pub use log::{Level, LogSink, NullSink, TracingSink};
pub use session::Session;
pub use transport::{Channel, NetlinkTransport, Transport};
pub use types::{
    ChannelId, Device, DeviceState, Interface, PipeFilter, ProtocolVersion, RfKillState,
    RfKillStatus,
};

#[cfg(feature = "async")]
pub use readiness::ChannelReadiness;
