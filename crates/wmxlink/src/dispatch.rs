//! Routing of received frames to the session's handlers.
//!
//! Every datagram read from a channel is split into netlink frames. Frames
//! of the WiMAX family are routed by GENL command to the message-to-user or
//! state-change handler; the outcome is folded into a [`CallbackContext`]
//! so the first definitive result of a read wins.

use crate::context::{CallbackContext, Errno, Outcome};
use crate::error::Result;
use crate::log::{Level, Logger};
use crate::netlink::attr::Attrs;
use crate::netlink::genl::GenlMsgHdr;
use crate::netlink::message::{MessageIter, NlMsgError};
use crate::types::DeviceState;
use crate::wimax::{WimaxCmd, msg_attr, state_change_attr};

/// A message the kernel driver sent to user space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MsgToUser<'a> {
    /// Interface the message came from.
    pub ifindex: u32,
    /// Pipe tag; `None` for the default pipe.
    pub pipe: Option<&'a str>,
    pub data: &'a [u8],
}

/// A device state transition notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    pub ifindex: u32,
    pub old: DeviceState,
    pub new: DeviceState,
}

/// What a handler wants the receive loop to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Record the outcome (if none is recorded yet) and keep going. An
    /// error skips the rest of the current message only.
    Continue(Outcome),
    /// End the current read; it returns the first recorded result, or 0.
    Stop,
}

/// Handler for `MSG_TO_USER` notifications.
pub type MsgToUserFn = Box<dyn FnMut(&MsgToUser<'_>) -> Action + Send>;

/// Handler for `RE_STATE_CHANGE` notifications.
pub type StateChangeFn = Box<dyn FnMut(&StateChange) -> Action + Send>;

/// The session's handler slots.
#[derive(Default)]
pub(crate) struct Handlers {
    pub(crate) msg_to_user: Option<MsgToUserFn>,
    pub(crate) state_change: Option<StateChangeFn>,
}

/// Whether to keep reading frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Stop,
}

/// Per-read routing state.
pub(crate) struct Dispatcher<'a> {
    pub(crate) handlers: &'a mut Handlers,
    pub(crate) family_id: u16,
    /// Interface the session is bound to; 0 accepts every interface.
    pub(crate) ifindex: u32,
    pub(crate) log: &'a Logger,
}

impl Dispatcher<'_> {
    /// Feed one datagram through the handlers.
    ///
    /// Frame errors abort the datagram and are returned; everything the
    /// handlers produce goes to `ctx`.
    pub(crate) fn feed(&mut self, data: &[u8], ctx: &mut CallbackContext) -> Result<Flow> {
        for result in MessageIter::new(data) {
            let (header, payload) = result?;

            if header.is_control() {
                continue;
            }

            if header.is_done() {
                ctx.mark_done();
                return Ok(Flow::Stop);
            }

            if header.is_error() {
                let err = NlMsgError::read(payload)?;
                ctx.maybe_set(ack_outcome(err.error));
                ctx.mark_done();
                return Ok(Flow::Stop);
            }

            if header.nlmsg_type != self.family_id {
                self.log.log(
                    Level::Debug,
                    format_args!("ignoring message type {:#x}", header.nlmsg_type),
                );
                ctx.maybe_set(Err(Errno::NODATA));
                continue;
            }

            if self.dispatch(payload, ctx) == Flow::Stop {
                ctx.maybe_set(Ok(0));
                ctx.mark_done();
                return Ok(Flow::Stop);
            }
        }
        Ok(Flow::Continue)
    }

    /// Route one GENL payload by command.
    fn dispatch(&mut self, payload: &[u8], ctx: &mut CallbackContext) -> Flow {
        let (genl, attrs) = match GenlMsgHdr::split(payload) {
            Ok(parts) => parts,
            Err(e) => {
                self.log.log(Level::Error, format_args!("cannot parse GENL header: {}", e));
                ctx.maybe_set(Err(Errno::MALFORMED));
                return Flow::Continue;
            }
        };

        let action = match WimaxCmd::from_u8(genl.cmd) {
            Some(WimaxCmd::MsgToUser) if self.handlers.msg_to_user.is_some() => {
                self.msg_to_user(attrs)
            }
            Some(WimaxCmd::ReStateChange) if self.handlers.state_change.is_some() => {
                self.state_change(attrs)
            }
            _ => {
                self.log.log(
                    Level::Debug,
                    format_args!("no handler for GENL command {}", genl.cmd),
                );
                Some(Action::Continue(Err(Errno::NODATA)))
            }
        };

        match action {
            // Addressed to another interface.
            None => Flow::Continue,
            Some(Action::Stop) => Flow::Stop,
            Some(Action::Continue(outcome)) => {
                ctx.maybe_set(outcome);
                Flow::Continue
            }
        }
    }

    fn msg_to_user(&mut self, data: &[u8]) -> Option<Action> {
        let attrs = Attrs::parse(data, msg_attr::MAX);
        let ifindex = match attrs.u32(msg_attr::IFIDX) {
            Ok(Some(ifindex)) => ifindex,
            _ => return Some(self.malformed("msg-to-user", "IFIDX")),
        };
        if self.ifindex > 0 && ifindex != self.ifindex {
            return None;
        }
        let Some(payload) = attrs.get(msg_attr::DATA) else {
            return Some(self.malformed("msg-to-user", "MSG_DATA"));
        };
        let Ok(pipe) = attrs.string(msg_attr::PIPE_NAME) else {
            return Some(self.malformed("msg-to-user", "PIPE_NAME"));
        };

        self.log.log(
            Level::Trace,
            format_args!("msg from kernel {} bytes pipe {}", payload.len(), pipe.unwrap_or("(default)")),
        );
        let msg = MsgToUser {
            ifindex,
            pipe,
            data: payload,
        };
        self.handlers.msg_to_user.as_mut().map(|cb| cb(&msg))
    }

    fn state_change(&mut self, data: &[u8]) -> Option<Action> {
        let attrs = Attrs::parse(data, state_change_attr::MAX);
        let ifindex = attrs.u32(state_change_attr::IFIDX).ok().flatten().unwrap_or(0);
        if self.ifindex > 0 && ifindex > 0 && ifindex != self.ifindex {
            return None;
        }
        let Ok(Some(old)) = attrs.u8(state_change_attr::STATE_OLD) else {
            return Some(self.malformed("state-change", "STATE_OLD"));
        };
        let Ok(Some(new)) = attrs.u8(state_change_attr::STATE_NEW) else {
            return Some(self.malformed("state-change", "STATE_NEW"));
        };

        let change = StateChange {
            ifindex: if ifindex > 0 { ifindex } else { self.ifindex },
            old: DeviceState::from_u8(old),
            new: DeviceState::from_u8(new),
        };
        self.log.log(
            Level::Debug,
            format_args!("state change {} -> {}", change.old, change.new),
        );
        self.handlers.state_change.as_mut().map(|cb| cb(&change))
    }

    fn malformed(&self, what: &str, attr: &str) -> Action {
        self.log.log(Level::Error, format_args!("{}: cannot find {} attribute", what, attr));
        Action::Continue(Err(Errno::MALFORMED))
    }
}

/// Map an ACK/error code to an outcome: non-negative codes are results the
/// kernel handler returned through the ACK.
pub(crate) fn ack_outcome(code: i32) -> Outcome {
    if code >= 0 {
        Ok(code as usize)
    } else {
        Err(Errno(code))
    }
}

/// Find the ACK for request `seq` in a datagram.
pub(crate) fn find_ack(data: &[u8], seq: u32) -> Result<Option<Outcome>> {
    for result in MessageIter::new(data) {
        let (header, payload) = result?;
        if header.nlmsg_seq != seq || !header.is_error() {
            continue;
        }
        let err = NlMsgError::read(payload)?;
        return Ok(Some(ack_outcome(err.error)));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::NullSink;
    use crate::netlink::builder::MessageBuilder;
    use crate::netlink::message::{NLMSG_ERROR, NlMsgHdr};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    const FAMILY: u16 = 0x1d;

    fn logger() -> Logger {
        Logger::new(Arc::new(NullSink), "wmx0")
    }

    fn msg_to_user(ifindex: u32, pipe: Option<&str>, data: &[u8]) -> Vec<u8> {
        let mut b = MessageBuilder::genl(FAMILY, 0, WimaxCmd::MsgToUser as u8, 1);
        b.attr_u32(msg_attr::IFIDX, ifindex);
        if let Some(pipe) = pipe {
            b.attr_str(msg_attr::PIPE_NAME, pipe);
        }
        b.attr(msg_attr::DATA, data);
        b.finish()
    }

    fn state_change(old: u8, new: Option<u8>) -> Vec<u8> {
        let mut b = MessageBuilder::genl(FAMILY, 0, WimaxCmd::ReStateChange as u8, 1);
        b.attr_u32(state_change_attr::IFIDX, 3);
        b.attr_u8(state_change_attr::STATE_OLD, old);
        if let Some(new) = new {
            b.attr_u8(state_change_attr::STATE_NEW, new);
        }
        b.finish()
    }

    fn ack(seq: u32, code: i32) -> Vec<u8> {
        let mut b = MessageBuilder::new(NLMSG_ERROR, 0);
        let mut payload = code.to_ne_bytes().to_vec();
        payload.extend_from_slice(NlMsgHdr::new(FAMILY, 0).as_bytes());
        b.payload(&payload);
        b.seq(seq);
        b.finish()
    }

    fn counting_handlers() -> (Handlers, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let (a, b) = (calls.clone(), calls.clone());
        let handlers = Handlers {
            msg_to_user: Some(Box::new(move |_: &MsgToUser<'_>| {
                a.fetch_add(1, Ordering::SeqCst);
                Action::Continue(Ok(1))
            })),
            state_change: Some(Box::new(move |_: &StateChange| {
                b.fetch_add(1, Ordering::SeqCst);
                Action::Continue(Ok(1))
            })),
        };
        (handlers, calls)
    }

    fn run(handlers: &mut Handlers, ifindex: u32, data: &[u8]) -> (Flow, CallbackContext) {
        let log = logger();
        let mut dispatcher = Dispatcher {
            handlers,
            family_id: FAMILY,
            ifindex,
            log: &log,
        };
        let mut ctx = CallbackContext::new();
        let flow = dispatcher.feed(data, &mut ctx).unwrap();
        (flow, ctx)
    }

    #[test]
    fn test_unknown_command_is_nodata() {
        let (mut handlers, calls) = counting_handlers();
        let msg = MessageBuilder::genl(FAMILY, 0, 42, 1).finish();
        let (flow, ctx) = run(&mut handlers, 3, &msg);
        assert_eq!(flow, Flow::Continue);
        assert_eq!(ctx.result(), Err(Errno::NODATA));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_known_command_without_handler_is_nodata() {
        let mut handlers = Handlers::default();
        let (_, ctx) = run(&mut handlers, 3, &msg_to_user(3, None, b"x"));
        assert_eq!(ctx.result(), Err(Errno::NODATA));
    }

    #[test]
    fn test_other_family_is_nodata() {
        let (mut handlers, calls) = counting_handlers();
        let msg = MessageBuilder::genl(FAMILY + 1, 0, WimaxCmd::MsgToUser as u8, 1).finish();
        let (_, ctx) = run(&mut handlers, 3, &msg);
        assert_eq!(ctx.result(), Err(Errno::NODATA));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_msg_to_user_fields() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        let mut handlers = Handlers {
            msg_to_user: Some(Box::new(move |m: &MsgToUser<'_>| {
                s.lock()
                    .unwrap()
                    .push((m.ifindex, m.pipe.map(String::from), m.data.to_vec()));
                Action::Continue(Ok(m.data.len()))
            })),
            state_change: None,
        };
        let (_, ctx) = run(&mut handlers, 0, &msg_to_user(5, Some("diag"), b"hello"));
        assert_eq!(ctx.result(), Ok(5));
        assert_eq!(
            seen.lock().unwrap()[0],
            (5, Some("diag".to_string()), b"hello".to_vec())
        );
    }

    #[test]
    fn test_other_interface_is_skipped_silently() {
        let (mut handlers, calls) = counting_handlers();
        let (_, ctx) = run(&mut handlers, 3, &msg_to_user(4, None, b"x"));
        assert!(ctx.is_pending());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_stop_ends_datagram_and_first_result_wins() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let mut handlers = Handlers {
            msg_to_user: Some(Box::new(move |_: &MsgToUser<'_>| {
                c.fetch_add(1, Ordering::SeqCst);
                Action::Stop
            })),
            state_change: Some(Box::new(|_: &StateChange| Action::Continue(Ok(9)))),
        };
        let mut data = state_change(4, Some(5));
        data.extend(msg_to_user(3, None, b"a"));
        data.extend(msg_to_user(3, None, b"b"));

        let (flow, ctx) = run(&mut handlers, 3, &data);
        assert_eq!(flow, Flow::Stop);
        assert!(ctx.is_done());
        assert_eq!(ctx.result(), Ok(9));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stop_without_result_yields_zero() {
        let mut handlers = Handlers {
            msg_to_user: None,
            state_change: Some(Box::new(|_: &StateChange| Action::Stop)),
        };
        let (_, ctx) = run(&mut handlers, 3, &state_change(4, Some(5)));
        assert_eq!(ctx.result(), Ok(0));
    }

    #[test]
    fn test_missing_state_attribute_is_malformed() {
        let (mut handlers, calls) = counting_handlers();
        let (_, ctx) = run(&mut handlers, 3, &state_change(4, None));
        assert_eq!(ctx.result(), Err(Errno::MALFORMED));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_ack_closes_exchange_without_overwriting() {
        let (mut handlers, _) = counting_handlers();
        let mut data = msg_to_user(3, None, b"payload");
        data.extend(ack(1, -libc::EIO));
        let (flow, ctx) = run(&mut handlers, 3, &data);
        assert_eq!(flow, Flow::Stop);
        assert_eq!(ctx.result(), Ok(1));
    }

    #[test]
    fn test_find_ack_matches_sequence() {
        let mut data = ack(6, 0);
        data.extend(ack(7, 3));
        assert_eq!(find_ack(&data, 7).unwrap(), Some(Ok(3)));
        assert_eq!(find_ack(&data, 8).unwrap(), None);
        assert_eq!(find_ack(&ack(2, -libc::ENODEV), 2).unwrap(), Some(Err(Errno::NODEV)));
    }
}
