//! Scripted in-memory kernel peer for session tests.
//!
//! `MockKernel` implements `Transport`: every channel it hands out is a
//! queue of datagrams. Requests sent on a channel are answered the way the
//! kernel WiMAX stack answers them (control-family lookups, radio-kill,
//! reset, state queries, messages from user space), and tests inject
//! notifications with `broadcast`.

#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::io;
use std::os::unix::io::RawFd;
use std::sync::{Arc, Mutex, MutexGuard};

use wmxlink::netlink::attr::Attrs;
use wmxlink::netlink::builder::MessageBuilder;
use wmxlink::netlink::genl::{CtrlAttr, CtrlAttrMcastGrp, CtrlCmd, GENL_ID_CTRL, GenlMsgHdr};
use wmxlink::netlink::message::{MessageIter, NLMSG_ERROR, NlMsgHdr};
use wmxlink::wimax::{WimaxCmd, msg_attr, rfkill_attr, state_change_attr};
use wmxlink::{
    Channel, Device, DeviceState, Error, Interface, Level, LogSink, Result, SessionConfig,
    Transport,
};

pub const FAMILY_ID: u16 = 0x1d;
pub const WMX0_INDEX: u32 = 3;
pub const MSG_GROUP: u32 = 7;
pub const DIAG_GROUP: u32 = 8;

/// A registered generic netlink family.
#[derive(Debug, Clone)]
pub struct MockFamily {
    pub name: String,
    pub id: u16,
    pub version: u8,
    pub groups: Vec<(String, u32)>,
}

impl MockFamily {
    pub fn wimax(name: &str, version: u8) -> Self {
        Self {
            name: name.to_string(),
            id: FAMILY_ID,
            version,
            groups: vec![("msg".into(), MSG_GROUP), ("diag".into(), DIAG_GROUP)],
        }
    }
}

#[derive(Default)]
struct Socket {
    inbox: VecDeque<Vec<u8>>,
    groups: HashSet<u32>,
    open: bool,
}

/// Kernel-side state, inspectable from tests.
pub struct Kernel {
    pub interfaces: Vec<Interface>,
    pub families: Vec<MockFamily>,
    sockets: Vec<Socket>,
    pub rfkill_hw: bool,
    pub rfkill_sw: bool,
    /// ACK codes returned by the next radio-kill requests instead of the
    /// switch status.
    pub rfkill_replies: VecDeque<i32>,
    pub reset_reply: i32,
    pub state: DeviceState,
    /// `(pipe, data)` of every message written from user space.
    pub written: Vec<(Option<String>, Vec<u8>)>,
    /// Commands received, in order.
    pub commands: Vec<u8>,
}

impl Kernel {
    fn ack(&mut self, socket: usize, request: &NlMsgHdr, code: i32) {
        let mut b = MessageBuilder::new(NLMSG_ERROR, 0);
        let mut payload = code.to_ne_bytes().to_vec();
        payload.extend_from_slice(request.as_bytes());
        b.payload(&payload)
            .seq(request.nlmsg_seq)
            .port(request.nlmsg_pid);
        self.sockets[socket].inbox.push_back(b.finish());
    }

    fn handle(&mut self, socket: usize, msg: &[u8]) {
        for frame in MessageIter::new(msg) {
            let Ok((header, payload)) = frame else {
                return;
            };
            let Ok((genl, attrs)) = GenlMsgHdr::split(payload) else {
                self.ack(socket, &header, -libc::EINVAL);
                continue;
            };
            if header.nlmsg_type == GENL_ID_CTRL {
                self.get_family(socket, &header, genl, attrs);
            } else if header.nlmsg_type == FAMILY_ID {
                let code = self.command(genl.cmd, attrs);
                self.ack(socket, &header, code);
            } else {
                self.ack(socket, &header, -libc::EOPNOTSUPP);
            }
        }
    }

    fn get_family(&mut self, socket: usize, request: &NlMsgHdr, genl: GenlMsgHdr, attrs: &[u8]) {
        let attrs = Attrs::parse(attrs, CtrlAttr::McastGroups as u16);
        let name = attrs.string(CtrlAttr::FamilyName as u16).ok().flatten();
        let family = self
            .families
            .iter()
            .find(|f| Some(f.name.as_str()) == name)
            .cloned();
        let Some(family) = family.filter(|_| genl.cmd == CtrlCmd::GetFamily as u8) else {
            self.ack(socket, request, -libc::ENOENT);
            return;
        };

        let mut b = MessageBuilder::genl(GENL_ID_CTRL, 0, CtrlCmd::NewFamily as u8, 2);
        b.attr_str(CtrlAttr::FamilyName as u16, &family.name);
        b.attr_u16(CtrlAttr::FamilyId as u16, family.id);
        b.attr_u32(CtrlAttr::Version as u16, family.version as u32);
        b.attr_u32(CtrlAttr::MaxAttr as u16, 3);
        b.nested(CtrlAttr::McastGroups as u16, |b| {
            for (i, (name, id)) in family.groups.iter().enumerate() {
                b.nested(i as u16 + 1, |b| {
                    b.attr_u32(CtrlAttrMcastGrp::Id as u16, *id)
                        .attr_str(CtrlAttrMcastGrp::Name as u16, name);
                });
            }
        });
        b.seq(request.nlmsg_seq).port(request.nlmsg_pid);
        self.sockets[socket].inbox.push_back(b.finish());
        self.ack(socket, request, 0);
    }

    fn command(&mut self, cmd: u8, data: &[u8]) -> i32 {
        self.commands.push(cmd);
        let attrs = Attrs::parse(data, 3);
        match WimaxCmd::from_u8(cmd) {
            Some(WimaxCmd::RfKill) => {
                match attrs.u32(rfkill_attr::STATE).ok().flatten() {
                    Some(0) => self.rfkill_sw = false,
                    Some(1) => self.rfkill_sw = true,
                    Some(2) => {}
                    _ => return -libc::EINVAL,
                }
                self.rfkill_replies.pop_front().unwrap_or(
                    (self.rfkill_hw as i32) | ((self.rfkill_sw as i32) << 1),
                )
            }
            Some(WimaxCmd::Reset) => self.reset_reply,
            Some(WimaxCmd::StateGet) => self.state as i32,
            Some(WimaxCmd::MsgFromUser) => {
                let pipe = attrs
                    .string(msg_attr::PIPE_NAME)
                    .ok()
                    .flatten()
                    .map(String::from);
                let Some(payload) = attrs.get(msg_attr::DATA) else {
                    return -libc::EINVAL;
                };
                self.written.push((pipe, payload.to_vec()));
                0
            }
            _ => -libc::EOPNOTSUPP,
        }
    }
}

/// Shared handle to the mock kernel; doubles as the session transport.
#[derive(Clone)]
pub struct MockKernel(Arc<Mutex<Kernel>>);

impl MockKernel {
    /// A kernel with `wmx0` (index 3) and family `"WiMAX 3"` at `version`.
    pub fn new(version: u8) -> Self {
        Self(Arc::new(Mutex::new(Kernel {
            interfaces: vec![
                Interface {
                    name: "lo".into(),
                    index: 1,
                },
                Interface {
                    name: "wmx0".into(),
                    index: WMX0_INDEX,
                },
            ],
            families: vec![MockFamily::wimax("WiMAX 3", version)],
            sockets: Vec::new(),
            rfkill_hw: true,
            rfkill_sw: false,
            rfkill_replies: VecDeque::new(),
            reset_reply: 0,
            state: DeviceState::Ready,
            written: Vec::new(),
            commands: Vec::new(),
        })))
    }

    pub fn lock(&self) -> MutexGuard<'_, Kernel> {
        self.0.lock().unwrap()
    }

    /// Deliver a datagram to every open socket that joined `group`.
    pub fn broadcast(&self, group: u32, msg: Vec<u8>) {
        let mut kernel = self.lock();
        for socket in kernel.sockets.iter_mut() {
            if socket.open && socket.groups.contains(&group) {
                socket.inbox.push_back(msg.clone());
            }
        }
    }

    /// Number of open sockets joined to `group`.
    pub fn members(&self, group: u32) -> usize {
        self.lock()
            .sockets
            .iter()
            .filter(|s| s.open && s.groups.contains(&group))
            .count()
    }

    pub fn open_sockets(&self) -> usize {
        self.lock().sockets.iter().filter(|s| s.open).count()
    }
}

impl Transport for MockKernel {
    type Channel = MockChannel;

    fn open_channel(&self) -> Result<MockChannel> {
        let mut kernel = self.lock();
        kernel.sockets.push(Socket {
            open: true,
            ..Default::default()
        });
        Ok(MockChannel {
            kernel: self.clone(),
            index: kernel.sockets.len() - 1,
        })
    }

    fn resolve_device(&self, device: &Device) -> Result<Option<Interface>> {
        let kernel = self.lock();
        let found = match device {
            Device::Any => return Ok(None),
            Device::Name(name) => kernel.interfaces.iter().find(|i| &i.name == name),
            Device::Index(index) => kernel.interfaces.iter().find(|i| i.index == *index),
        };
        found.cloned().map(Some).ok_or_else(|| Error::NoSuchDevice {
            device: device.to_string(),
        })
    }
}

/// One mock socket.
pub struct MockChannel {
    kernel: MockKernel,
    index: usize,
}

impl Channel for MockChannel {
    fn send(&mut self, msg: &[u8]) -> Result<()> {
        self.kernel.lock().handle(self.index, msg);
        Ok(())
    }

    /// Never blocks: an empty queue is reported as `WouldBlock`.
    fn recv(&mut self) -> Result<Vec<u8>> {
        self.kernel.lock().sockets[self.index]
            .inbox
            .pop_front()
            .ok_or_else(|| Error::Io(io::Error::new(io::ErrorKind::WouldBlock, "no message queued")))
    }

    fn join_group(&mut self, group: u32) -> Result<()> {
        self.kernel.lock().sockets[self.index].groups.insert(group);
        Ok(())
    }

    fn leave_group(&mut self, group: u32) -> Result<()> {
        self.kernel.lock().sockets[self.index].groups.remove(&group);
        Ok(())
    }

    fn port_id(&self) -> u32 {
        100 + self.index as u32
    }

    fn raw_fd(&self) -> RawFd {
        1000 + self.index as RawFd
    }
}

impl Drop for MockChannel {
    fn drop(&mut self) {
        if let Ok(mut kernel) = self.kernel.0.lock() {
            kernel.sockets[self.index].open = false;
        }
    }
}

/// Log sink that keeps every entry.
#[derive(Default)]
pub struct CaptureSink(Mutex<Vec<(Level, String)>>);

impl CaptureSink {
    pub fn entries(&self) -> Vec<(Level, String)> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, level: Level) -> usize {
        self.entries().iter().filter(|(l, _)| *l == level).count()
    }
}

impl LogSink for CaptureSink {
    fn log(&self, level: Level, _device: &str, args: fmt::Arguments<'_>) {
        self.0.lock().unwrap().push((level, args.to_string()));
    }
}

/// Config speaking version 1.0 with a capturing sink.
pub fn config_v10(sink: Arc<CaptureSink>) -> SessionConfig {
    SessionConfig::new()
        .expected_version(wmxlink::ProtocolVersion::new(1, 0))
        .log_sink(sink)
}

/// A `MSG_TO_USER` notification.
pub fn msg_to_user(ifindex: u32, pipe: Option<&str>, data: &[u8]) -> Vec<u8> {
    let mut b = MessageBuilder::genl(FAMILY_ID, 0, WimaxCmd::MsgToUser as u8, 10);
    b.attr_u32(msg_attr::IFIDX, ifindex);
    if let Some(pipe) = pipe {
        b.attr_str(msg_attr::PIPE_NAME, pipe);
    }
    b.attr(msg_attr::DATA, data);
    b.finish()
}

/// A `RE_STATE_CHANGE` notification.
pub fn state_change(ifindex: u32, old: DeviceState, new: DeviceState) -> Vec<u8> {
    let mut b = MessageBuilder::genl(FAMILY_ID, 0, WimaxCmd::ReStateChange as u8, 10);
    b.attr_u32(state_change_attr::IFIDX, ifindex);
    b.attr_u8(state_change_attr::STATE_OLD, old as u8);
    b.attr_u8(state_change_attr::STATE_NEW, new as u8);
    b.finish()
}

/// A well-formed message of the family with an unknown command.
pub fn unknown_command(cmd: u8) -> Vec<u8> {
    MessageBuilder::genl(FAMILY_ID, 0, cmd, 10).finish()
}
