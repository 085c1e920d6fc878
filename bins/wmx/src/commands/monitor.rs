//! Notification monitor.

use clap::Args;
use serde::Serialize;
use wmxlink::wimax::DEFAULT_CHANNEL;
use wmxlink::{Action, ChannelId, ChannelReadiness, DeviceState, MsgToUser, StateChange};

use super::WmxSession;
use crate::output::{OutputFormat, hex_encode};

#[derive(Args)]
pub struct MonitorCmd {
    /// Channel to watch instead of the default one.
    #[arg(long)]
    pub channel: Option<String>,

    /// Stop after this many notifications (0 watches forever).
    #[arg(short = 'c', long, default_value_t = 0)]
    pub count: usize,
}

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
enum Event<'a> {
    Message {
        ifindex: u32,
        pipe: Option<&'a str>,
        data: String,
    },
    StateChange {
        ifindex: u32,
        old: DeviceState,
        new: DeviceState,
    },
}

fn emit(format: OutputFormat, event: &Event<'_>) {
    if format.is_json() {
        if let Err(e) = format.print_json(event) {
            tracing::warn!("cannot print event: {}", e);
        }
        return;
    }
    match event {
        Event::Message { ifindex, pipe, data } => {
            println!("#{} msg pipe {} {}", ifindex, pipe.unwrap_or("-"), data)
        }
        Event::StateChange { ifindex, old, new } => {
            println!("#{} state {} -> {}", ifindex, old, new)
        }
    }
}

impl MonitorCmd {
    /// Channel that has to be opened for the watch; the default one is
    /// open for the whole session.
    fn extra_channel(&self) -> Option<&str> {
        self.channel
            .as_deref()
            .filter(|name| *name != DEFAULT_CHANNEL)
    }

    pub async fn run(&self, session: &mut WmxSession, format: OutputFormat) -> anyhow::Result<()> {
        let id = match self.extra_channel() {
            Some(name) => session.open_channel(name)?,
            None => ChannelId::DEFAULT,
        };

        session.set_msg_to_user_cb(Some(Box::new(move |m: &MsgToUser<'_>| {
            emit(
                format,
                &Event::Message {
                    ifindex: m.ifindex,
                    pipe: m.pipe,
                    data: hex_encode(m.data),
                },
            );
            Action::Continue(Ok(m.data.len()))
        })));
        session.set_state_change_cb(Some(Box::new(move |c: &StateChange| {
            emit(
                format,
                &Event::StateChange {
                    ifindex: c.ifindex,
                    old: c.old,
                    new: c.new,
                },
            );
            Action::Continue(Ok(0))
        })));

        let ready = ChannelReadiness::new(session.channel_fd(id)?)?;
        let mut seen = 0;
        while self.count == 0 || seen < self.count {
            ready.readable().await?;
            match session.read_channel(id) {
                Ok(_) => seen += 1,
                Err(e) if e.is_retryable() => continue,
                Err(e) => return Err(e.into()),
            }
        }
        drop(ready);

        if id != ChannelId::DEFAULT {
            session.close_channel(id);
        }
        Ok(())
    }
}
