//! Family info, reset and state commands.

use serde::Serialize;
use wmxlink::{DeviceState, ProtocolVersion};

use super::WmxSession;
use crate::output::OutputFormat;

#[derive(Serialize)]
struct ChannelInfo<'a> {
    id: usize,
    name: &'a str,
    group: u32,
    open: bool,
}

#[derive(Serialize)]
struct FamilyInfo<'a> {
    interface: &'a str,
    ifindex: u32,
    family: &'a str,
    family_id: u16,
    version: ProtocolVersion,
    version_warning: bool,
    channels: Vec<ChannelInfo<'a>>,
}

pub fn info(session: &WmxSession, format: OutputFormat) -> anyhow::Result<()> {
    let channels = session
        .channel_names()
        .filter_map(|name| {
            let id = session.channel(name)?;
            Some(ChannelInfo {
                id: id.0,
                name,
                group: session.channel_group(id)?,
                open: session.is_channel_open(id),
            })
        })
        .collect();
    let info = FamilyInfo {
        interface: session.ifname(),
        ifindex: session.ifindex(),
        family: session.family_name(),
        family_id: session.family_id(),
        version: session.version(),
        version_warning: session.version_warning(),
        channels,
    };

    if format.is_json() {
        return format.print_json(&info);
    }

    println!("{} (ifindex {})", info.interface, info.ifindex);
    print!("  family \"{}\" id {} version {}", info.family, info.family_id, info.version);
    if info.version_warning {
        print!(" (older than expected)");
    }
    println!();
    for ch in &info.channels {
        println!(
            "  channel {} \"{}\" group {}{}",
            ch.id,
            ch.name,
            ch.group,
            if ch.open { " open" } else { "" }
        );
    }
    Ok(())
}

pub fn reset(session: &mut WmxSession) -> anyhow::Result<()> {
    session.reset()?;
    tracing::info!(device = session.ifname(), "reset done");
    Ok(())
}

#[derive(Serialize)]
struct StateOutput {
    state: DeviceState,
}

pub fn state(session: &mut WmxSession, format: OutputFormat) -> anyhow::Result<()> {
    let state = session.state_get()?;
    if format.is_json() {
        format.print_json(&StateOutput { state })
    } else {
        println!("{}", state);
        Ok(())
    }
}

#[derive(Serialize)]
struct ChangeOutput {
    old: DeviceState,
    new: DeviceState,
}

pub fn wait_state_change(session: &mut WmxSession, format: OutputFormat) -> anyhow::Result<()> {
    let (old, new) = session.wait_for_state_change()?;
    if format.is_json() {
        format.print_json(&ChangeOutput { old, new })
    } else {
        println!("{} -> {}", old, new);
        Ok(())
    }
}
