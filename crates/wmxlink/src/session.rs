//! WiMAX control session.
//!
//! A [`Session`] owns a command channel (requests and their ACKs) and the
//! channel registry whose slot 0 is the default `"msg"` broadcast group.
//! The blocking wrappers send one request and wait for its ACK; the
//! notification reads feed every received frame through the dispatcher.

use std::os::unix::io::RawFd;
use std::sync::{Arc, OnceLock};

use crate::channel::ChannelRegistry;
use crate::config::SessionConfig;
use crate::context::{CallbackContext, Errno, Outcome};
use crate::dispatch::{
    Action, Dispatcher, Handlers, MsgToUser, MsgToUserFn, StateChange, StateChangeFn, find_ack,
};
use crate::error::{Error, Result};
use crate::log::{Level, Logger};
use crate::netlink::attr::NLA_HDRLEN;
use crate::netlink::builder::MessageBuilder;
use crate::netlink::message::{NLM_F_ACK, NLM_F_REQUEST};
use crate::resolve::{VersionCheck, resolve_family};
use crate::transport::{Channel, NetlinkTransport, Transport};
use crate::types::{
    ChannelId, Device, DeviceState, Interface, PipeFilter, ProtocolVersion, RfKillState,
    RfKillStatus,
};
use crate::wimax::{
    DEFAULT_CHANNEL, WimaxCmd, msg_attr, reset_attr, rfkill_attr, state_get_attr,
};

/// Largest payload one attribute can carry.
const MAX_ATTR_PAYLOAD: usize = u16::MAX as usize - NLA_HDRLEN;

/// An open control connection to one WiMAX device, or to all of them.
///
/// # Example
///
/// ```rust,no_run
/// use wmxlink::{Device, RfKillState, Session};
///
/// # fn example() -> wmxlink::Result<()> {
/// let mut session = Session::connect(Device::parse("wmx0"))?;
/// let status = session.rfkill(RfKillState::Query)?;
/// println!("hw {} sw {}", status.hardware_on(), status.software_on());
/// println!("state {}", session.state_get()?);
/// # Ok(())
/// # }
/// ```
pub struct Session<T: Transport> {
    transport: T,
    tx: T::Channel,
    iface: Option<Interface>,
    family_name: String,
    family_id: u16,
    version: ProtocolVersion,
    request_version: u8,
    version_warning: bool,
    channels: ChannelRegistry<T::Channel>,
    handlers: Handlers,
    log: Logger,
    seq: u32,
}

impl Session<NetlinkTransport> {
    /// Open a session over the kernel's generic netlink with default
    /// settings.
    pub fn connect(device: Device) -> Result<Self> {
        Self::open(NetlinkTransport::new(), device, SessionConfig::default())
    }
}

impl<T: Transport> Session<T> {
    /// Open a session: resolve the device and the WiMAX family, check the
    /// interface version and open the default channel.
    pub fn open(transport: T, device: Device, config: SessionConfig) -> Result<Self> {
        let iface = transport.resolve_device(&device)?;
        let log = Logger::new(
            config.sink().clone(),
            iface.as_ref().map_or_else(|| "any".to_string(), |i| i.name.clone()),
        );

        let mut tx = transport.open_channel()?;
        let mut seq: u32 = 1;
        let family = resolve_family(&mut tx, iface.as_ref(), &config, &log, || {
            let current = seq;
            seq = seq.wrapping_add(1);
            current
        })?;

        let mut channels = ChannelRegistry::from_groups(&family.info.mcast_groups, &log)?;
        channels.open(DEFAULT_CHANNEL, || transport.open_channel())?;

        let mut session = Self {
            transport,
            tx,
            iface,
            family_name: family.name,
            family_id: family.info.id,
            version: family.version,
            request_version: config.version().to_wire(),
            version_warning: family.check == VersionCheck::OlderMinor,
            channels,
            handlers: Handlers::default(),
            log,
            seq,
        };

        if session.iface.is_some() && config.probes() {
            session.probe()?;
        }
        Ok(session)
    }

    /// Close the session, leaving every open channel.
    pub fn close(self) {}

    /// Interface the session is bound to; `None` for an "any" session.
    pub fn interface(&self) -> Option<&Interface> {
        self.iface.as_ref()
    }

    /// Interface name, or `"any"`.
    pub fn ifname(&self) -> &str {
        self.iface.as_ref().map_or("any", |i| i.name.as_str())
    }

    /// Interface index; 0 for an "any" session.
    pub fn ifindex(&self) -> u32 {
        self.iface.as_ref().map_or(0, |i| i.index)
    }

    /// Generic netlink family in use.
    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    pub fn family_id(&self) -> u16 {
        self.family_id
    }

    /// Interface version the kernel advertised.
    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// Whether the kernel's minor version is older than expected.
    pub fn version_warning(&self) -> bool {
        self.version_warning
    }

    /// Known channel names, default channel first.
    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.names()
    }

    /// Registry slot of a channel name.
    pub fn channel(&self, name: &str) -> Option<ChannelId> {
        self.channels.lookup(name)
    }

    pub fn channel_name(&self, id: ChannelId) -> Option<&str> {
        self.channels.name(id)
    }

    /// Multicast group id behind a channel.
    pub fn channel_group(&self, id: ChannelId) -> Option<u32> {
        self.channels.group(id)
    }

    pub fn is_channel_open(&self, id: ChannelId) -> bool {
        self.channels.is_open(id)
    }

    /// Install the message-to-user handler, returning the previous one.
    pub fn set_msg_to_user_cb(&mut self, cb: Option<MsgToUserFn>) -> Option<MsgToUserFn> {
        std::mem::replace(&mut self.handlers.msg_to_user, cb)
    }

    /// Install the state-change handler, returning the previous one.
    pub fn set_state_change_cb(&mut self, cb: Option<StateChangeFn>) -> Option<StateChangeFn> {
        std::mem::replace(&mut self.handlers.state_change, cb)
    }

    /// Open a receive handle on a named channel.
    pub fn open_channel(&mut self, name: &str) -> Result<ChannelId> {
        let transport = &self.transport;
        self.channels
            .open(name, || transport.open_channel())
            .inspect_err(|e| {
                self.log
                    .log(Level::Error, format_args!("channel \"{}\": cannot open: {}", name, e))
            })
    }

    /// Close a channel opened with [`open_channel`](Self::open_channel).
    pub fn close_channel(&mut self, id: ChannelId) {
        self.channels.close(id, &self.log);
    }

    /// Pollable descriptor of an open channel.
    pub fn channel_fd(&self, id: ChannelId) -> Result<RawFd> {
        self.channels.fd(id)
    }

    /// Pollable descriptor of the default channel.
    pub fn recv_fd(&self) -> Result<RawFd> {
        self.channels.fd(ChannelId::DEFAULT)
    }

    /// Receive one datagram on `id` and dispatch it.
    ///
    /// Fails with `InProgress` if nothing relevant arrived and `NoData` if
    /// nothing had a handler; otherwise returns the first handler result.
    pub fn read_channel(&mut self, id: ChannelId) -> Result<usize> {
        self.read_once(id)?.map_err(Error::from)
    }

    /// Read and dispatch on `id` until a handler produces a result.
    pub fn pipe_read(&mut self, id: ChannelId) -> Result<usize> {
        loop {
            match self.read_once(id)? {
                Err(Errno::INPROGRESS) | Err(Errno::NODATA) => continue,
                outcome => return outcome.map_err(Error::from),
            }
        }
    }

    /// Read and dispatch on the default channel until something relevant
    /// arrives.
    pub fn recv(&mut self) -> Result<usize> {
        loop {
            match self.read_once(ChannelId::DEFAULT)? {
                Err(Errno::INPROGRESS) => continue,
                outcome => return outcome.map_err(Error::from),
            }
        }
    }

    /// Block until a message-to-user arrives on channel `id` and return its
    /// payload.
    pub fn pipe_msg_read(&mut self, id: ChannelId) -> Result<Vec<u8>> {
        self.read_message(id, PipeMatch::Any)
    }

    /// Block until a message matching `filter` arrives on the default
    /// channel and return its payload.
    pub fn msg_read(&mut self, filter: PipeFilter<'_>) -> Result<Vec<u8>> {
        self.read_message(ChannelId::DEFAULT, PipeMatch::from(filter))
    }

    /// Send an opaque message to the driver, optionally tagged with a pipe
    /// name.
    pub fn msg_write(&mut self, pipe: Option<&str>, data: &[u8]) -> Result<()> {
        let ifindex = self.bound_ifindex()?;
        if let Some(pipe) = pipe.filter(|p| p.len() + 1 > MAX_ATTR_PAYLOAD) {
            return Err(Error::InvalidMessage(format!(
                "pipe name of {} bytes exceeds {} bytes",
                pipe.len(),
                MAX_ATTR_PAYLOAD - 1
            )));
        }
        if data.len() > MAX_ATTR_PAYLOAD {
            return Err(Error::InvalidMessage(format!(
                "message of {} bytes exceeds {} bytes",
                data.len(),
                MAX_ATTR_PAYLOAD
            )));
        }
        self.command(WimaxCmd::MsgFromUser, |b| {
            b.attr_u32(msg_attr::IFIDX, ifindex);
            if let Some(pipe) = pipe {
                b.attr_str(msg_attr::PIPE_NAME, pipe);
            }
            b.attr(msg_attr::DATA, data);
        })?;
        Ok(())
    }

    /// Reset the device.
    ///
    /// `NoSuchDevice` means the reset escalated and the interface went
    /// away; the session must be dropped and reopened.
    pub fn reset(&mut self) -> Result<()> {
        let ifindex = self.bound_ifindex()?;
        let sent = self.command(WimaxCmd::Reset, |b| {
            b.attr_u32(reset_attr::IFIDX, ifindex);
        });
        match sent {
            Ok(_) => Ok(()),
            Err(e) if e.is_no_such_device() => {
                self.log.log(
                    Level::Warn,
                    format_args!("reset escalated; device is gone, reopen the session"),
                );
                Err(self.no_such_device())
            }
            Err(e) => Err(e),
        }
    }

    /// Set or query the software radio-kill switch. Returns the raw switch
    /// status after the operation.
    pub fn rfkill(&mut self, state: RfKillState) -> Result<RfKillStatus> {
        let ifindex = self.bound_ifindex()?;
        let code = self.command(WimaxCmd::RfKill, |b| {
            b.attr_u32(rfkill_attr::IFIDX, ifindex)
                .attr_u32(rfkill_attr::STATE, state as u32);
        })?;
        Ok(RfKillStatus(code as u8))
    }

    /// Query the device state.
    pub fn state_get(&mut self) -> Result<DeviceState> {
        let ifindex = self.bound_ifindex()?;
        let code = self.command(WimaxCmd::StateGet, |b| {
            b.attr_u32(state_get_attr::IFIDX, ifindex);
        })?;
        Ok(DeviceState::from_u8(u8::try_from(code).unwrap_or(u8::MAX)))
    }

    /// Block until the device reports a state change; returns `(old, new)`.
    ///
    /// Other notifications arriving meanwhile go to their own handlers. The
    /// state-change handler installed before the call is back in place when
    /// this returns, whatever the outcome.
    pub fn wait_for_state_change(&mut self) -> Result<(DeviceState, DeviceState)> {
        let slot: Arc<OnceLock<(DeviceState, DeviceState)>> = Arc::new(OnceLock::new());
        let sink = slot.clone();
        let saved = self.set_state_change_cb(Some(Box::new(move |change: &StateChange| {
            let _ = sink.set((change.old, change.new));
            Action::Stop
        })));

        let result = self.read_until(ChannelId::DEFAULT, || slot.get().is_some());
        self.set_state_change_cb(saved);

        result?;
        slot.get().copied().ok_or(Error::NoData)
    }

    fn read_message(&mut self, id: ChannelId, filter: PipeMatch) -> Result<Vec<u8>> {
        let slot: Arc<OnceLock<Vec<u8>>> = Arc::new(OnceLock::new());
        let sink = slot.clone();
        let saved = self.set_msg_to_user_cb(Some(Box::new(move |msg: &MsgToUser<'_>| {
            if sink.get().is_some() {
                return Action::Stop;
            }
            if !filter.matches(msg.pipe) {
                // Not addressed to us; keep reading.
                return Action::Continue(Err(Errno::INPROGRESS));
            }
            let _ = sink.set(msg.data.to_vec());
            Action::Stop
        })));

        let result = self.read_until(id, || slot.get().is_some());
        // Dropping the temporary handler releases its reference to `slot`.
        self.set_msg_to_user_cb(saved);

        result?;
        Arc::try_unwrap(slot)
            .ok()
            .and_then(OnceLock::into_inner)
            .ok_or(Error::NoData)
    }

    /// Keep reading `id` until `done` holds or a read fails. `done` is
    /// checked after every datagram, since the awaited frame may share one
    /// with frames that left an earlier result in the context.
    fn read_until(&mut self, id: ChannelId, done: impl Fn() -> bool) -> Result<()> {
        loop {
            let outcome = self.read_once(id)?;
            if done() {
                return Ok(());
            }
            match outcome {
                Ok(_) | Err(Errno::INPROGRESS) | Err(Errno::NODATA) => continue,
                Err(errno) => return Err(errno.into()),
            }
        }
    }

    /// Single-shot receive and dispatch.
    fn read_once(&mut self, id: ChannelId) -> Result<Outcome> {
        let ifindex = self.ifindex();
        let rx = match self.channels.handle_mut(id) {
            Ok(rx) => rx,
            Err(e) => {
                self.log.log(
                    Level::Error,
                    format_args!("BUG! reading from channel #{} which is not open", id),
                );
                return Err(e);
            }
        };
        let data = rx.recv()?;

        let mut ctx = CallbackContext::new();
        let mut dispatcher = Dispatcher {
            handlers: &mut self.handlers,
            family_id: self.family_id,
            ifindex,
            log: &self.log,
        };
        dispatcher.feed(&data, &mut ctx)?;
        Ok(ctx.result())
    }

    /// Send one request on the command channel and wait for its ACK.
    /// Non-negative ACK codes are the command's result.
    fn command(&mut self, cmd: WimaxCmd, build: impl FnOnce(&mut MessageBuilder)) -> Result<usize> {
        let seq = self.next_seq();
        let mut builder = MessageBuilder::genl(
            self.family_id,
            NLM_F_REQUEST | NLM_F_ACK,
            cmd as u8,
            self.request_version,
        );
        build(&mut builder);
        builder.seq(seq).port(self.tx.port_id());
        self.tx.send(&builder.finish())?;

        loop {
            let data = self.tx.recv()?;
            if let Some(outcome) = find_ack(&data, seq)? {
                return outcome.map_err(|Errno(errno)| Error::from_errno(errno));
            }
        }
    }

    /// Radio-kill query to check the device answers at all.
    fn probe(&mut self) -> Result<()> {
        match self.rfkill(RfKillState::Query) {
            Ok(_) => Ok(()),
            Err(e) if e.is_no_such_device() => {
                self.log.log(
                    Level::Error,
                    format_args!("device does not answer WiMAX requests: {}", e),
                );
                Err(self.no_such_device())
            }
            Err(e) => {
                self.log.log(Level::Debug, format_args!("rfkill probe failed: {}", e));
                Ok(())
            }
        }
    }

    fn bound_ifindex(&self) -> Result<u32> {
        self.iface.as_ref().map(|i| i.index).ok_or(Error::BadHandle)
    }

    fn no_such_device(&self) -> Error {
        Error::NoSuchDevice {
            device: self.ifname().to_string(),
        }
    }

    fn next_seq(&mut self) -> u32 {
        let seq = self.seq;
        self.seq = self.seq.wrapping_add(1);
        seq
    }
}

impl<T: Transport> Drop for Session<T> {
    fn drop(&mut self) {
        self.channels.close_all(&self.log);
    }
}

/// Owned form of [`PipeFilter`] for handlers that outlive the call.
enum PipeMatch {
    Named(String),
    Default,
    Any,
}

impl PipeMatch {
    fn matches(&self, pipe: Option<&str>) -> bool {
        let filter = match self {
            Self::Named(name) => PipeFilter::Named(name),
            Self::Default => PipeFilter::Default,
            Self::Any => PipeFilter::Any,
        };
        filter.matches(pipe)
    }
}

impl From<PipeFilter<'_>> for PipeMatch {
    fn from(filter: PipeFilter<'_>) -> Self {
        match filter {
            PipeFilter::Named(name) => Self::Named(name.to_string()),
            PipeFilter::Default => Self::Default,
            PipeFilter::Any => Self::Any,
        }
    }
}
