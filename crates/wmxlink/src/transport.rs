//! The datagram transport the session runs on.
//!
//! A [`Transport`] hands out [`Channel`]s (one connected generic netlink
//! socket each) and resolves interfaces. [`NetlinkTransport`] is the real
//! kernel implementation.

use std::os::unix::io::{AsRawFd, RawFd};

use crate::error::Result;
use crate::netlink::NetlinkSocket;
use crate::types::{Device, Interface};
use crate::util::SysfsNet;

/// One connected datagram handle.
pub trait Channel {
    /// Send one complete message.
    fn send(&mut self, msg: &[u8]) -> Result<()>;

    /// Block until one datagram arrives.
    fn recv(&mut self) -> Result<Vec<u8>>;

    /// Join a multicast group.
    fn join_group(&mut self, group: u32) -> Result<()>;

    /// Leave a multicast group.
    fn leave_group(&mut self, group: u32) -> Result<()>;

    /// Local port id, stamped into outgoing requests.
    fn port_id(&self) -> u32;

    /// Pollable descriptor.
    fn raw_fd(&self) -> RawFd;
}

/// Allocator of channels plus interface lookup.
pub trait Transport {
    type Channel: Channel;

    /// Allocate and connect a new channel.
    fn open_channel(&self) -> Result<Self::Channel>;

    /// Resolve a device to a live interface; `Device::Any` gives `None`,
    /// an unknown device gives `Error::NoSuchDevice`.
    fn resolve_device(&self, device: &Device) -> Result<Option<Interface>>;
}

/// Kernel transport: `NETLINK_GENERIC` sockets and sysfs interface lookup.
#[derive(Debug, Clone, Default)]
pub struct NetlinkTransport {
    sysfs: SysfsNet,
}

impl NetlinkTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transport for NetlinkTransport {
    type Channel = NetlinkSocket;

    fn open_channel(&self) -> Result<NetlinkSocket> {
        NetlinkSocket::generic()
    }

    fn resolve_device(&self, device: &Device) -> Result<Option<Interface>> {
        self.sysfs.resolve(device)
    }
}

impl Channel for NetlinkSocket {
    fn send(&mut self, msg: &[u8]) -> Result<()> {
        NetlinkSocket::send(self, msg)
    }

    fn recv(&mut self) -> Result<Vec<u8>> {
        self.recv_msg()
    }

    fn join_group(&mut self, group: u32) -> Result<()> {
        self.add_membership(group)
    }

    fn leave_group(&mut self, group: u32) -> Result<()> {
        self.drop_membership(group)
    }

    fn port_id(&self) -> u32 {
        self.pid()
    }

    fn raw_fd(&self) -> RawFd {
        self.as_raw_fd()
    }
}
