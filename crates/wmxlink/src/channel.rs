//! Bounded registry of the family's multicast groups.
//!
//! Slot 0 is always the default `"msg"` group. Each slot may hold one open
//! receive handle that has joined the group.

use std::os::unix::io::RawFd;

use crate::error::{Error, Result};
use crate::log::{Level, Logger};
use crate::transport::Channel;
use crate::types::ChannelId;
use crate::wimax::{DEFAULT_CHANNEL, MAX_CHANNEL_NAME, MAX_CHANNELS};

struct Slot<C> {
    name: String,
    group: u32,
    rx: Option<C>,
}

/// Channel name to group id to optional open handle.
pub struct ChannelRegistry<C> {
    slots: Vec<Slot<C>>,
}

impl<C: Channel> ChannelRegistry<C> {
    /// Build the table from the family's advertised groups.
    ///
    /// `"msg"` is mandatory and lands in slot 0; at most four more groups
    /// are kept in advertised order.
    pub fn from_groups(groups: &[(String, u32)], log: &Logger) -> Result<Self> {
        let Some(&(_, msg_group)) = groups.iter().find(|(name, _)| name == DEFAULT_CHANNEL) else {
            log.log(
                Level::Error,
                format_args!("cannot resolve multicast group \"{}\"; kernel too old?", DEFAULT_CHANNEL),
            );
            return Err(Error::ProtocolUnavailable(format!(
                "multicast group \"{}\" not advertised",
                DEFAULT_CHANNEL
            )));
        };

        let mut slots = Vec::with_capacity(MAX_CHANNELS);
        slots.push(Slot {
            name: DEFAULT_CHANNEL.to_string(),
            group: msg_group,
            rx: None,
        });

        for (name, group) in groups.iter().filter(|(name, _)| name != DEFAULT_CHANNEL) {
            if name.len() >= MAX_CHANNEL_NAME {
                log.log(
                    Level::Warn,
                    format_args!("multicast group name \"{}\" too long; ignored", name),
                );
                continue;
            }
            if slots.len() == MAX_CHANNELS {
                log.log(
                    Level::Warn,
                    format_args!(
                        "too many multicast groups (max {}); ignoring \"{}\"",
                        MAX_CHANNELS, name
                    ),
                );
                continue;
            }
            slots.push(Slot {
                name: name.clone(),
                group: *group,
                rx: None,
            });
        }

        Ok(Self { slots })
    }

    /// Slot for a group name.
    pub fn lookup(&self, name: &str) -> Option<ChannelId> {
        self.slots.iter().position(|s| s.name == name).map(ChannelId)
    }

    pub fn name(&self, id: ChannelId) -> Option<&str> {
        self.slots.get(id.0).map(|s| s.name.as_str())
    }

    pub fn group(&self, id: ChannelId) -> Option<u32> {
        self.slots.get(id.0).map(|s| s.group)
    }

    pub fn is_open(&self, id: ChannelId) -> bool {
        self.slots.get(id.0).is_some_and(|s| s.rx.is_some())
    }

    /// Known group names in slot order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|s| s.name.as_str())
    }

    /// Open a receive handle on `name` with `alloc` and join its group.
    ///
    /// An already open slot is left untouched and `alloc` is not called.
    pub fn open(&mut self, name: &str, alloc: impl FnOnce() -> Result<C>) -> Result<ChannelId> {
        let id = self
            .lookup(name)
            .ok_or_else(|| Error::ProtocolUnavailable(format!("unknown channel \"{}\"", name)))?;
        let slot = &mut self.slots[id.0];
        if slot.rx.is_some() {
            return Err(Error::AlreadyOpen(name.to_string()));
        }

        let mut rx = alloc()?;
        rx.join_group(slot.group)?;
        slot.rx = Some(rx);
        Ok(id)
    }

    /// Leave the group and drop the handle. Closing a slot that is not
    /// open is logged and otherwise ignored.
    pub fn close(&mut self, id: ChannelId, log: &Logger) {
        let Some(slot) = self.slots.get_mut(id.0) else {
            log.log(Level::Error, format_args!("BUG! channel #{} does not exist", id));
            return;
        };
        let Some(mut rx) = slot.rx.take() else {
            log.log(
                Level::Error,
                format_args!("BUG! closing channel \"{}\" which is not open", slot.name),
            );
            return;
        };
        if let Err(e) = rx.leave_group(slot.group) {
            log.log(
                Level::Warn,
                format_args!("channel \"{}\": leaving group {} failed: {}", slot.name, slot.group, e),
            );
        }
    }

    /// Close every open handle.
    pub fn close_all(&mut self, log: &Logger) {
        for index in 0..self.slots.len() {
            if self.slots[index].rx.is_some() {
                self.close(ChannelId(index), log);
            }
        }
    }

    /// Open handle for `id`.
    pub fn handle_mut(&mut self, id: ChannelId) -> Result<&mut C> {
        self.slots
            .get_mut(id.0)
            .and_then(|s| s.rx.as_mut())
            .ok_or(Error::BadChannel(id.0))
    }

    /// Descriptor of the open handle for `id`.
    pub fn fd(&self, id: ChannelId) -> Result<RawFd> {
        self.slots
            .get(id.0)
            .and_then(|s| s.rx.as_ref())
            .map(Channel::raw_fd)
            .ok_or(Error::BadChannel(id.0))
    }
}
