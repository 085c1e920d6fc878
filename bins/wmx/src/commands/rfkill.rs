//! Radio-kill switch command.

use clap::{Args, ValueEnum};
use serde::Serialize;
use wmxlink::RfKillState;

use super::WmxSession;
use crate::output::OutputFormat;

#[derive(Args)]
pub struct RfkillCmd {
    /// Requested software switch position.
    #[arg(value_enum, default_value = "query")]
    pub state: Switch,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Switch {
    /// Allow the radio.
    On,
    /// Kill the radio.
    Off,
    /// Only report the switches.
    Query,
}

impl From<Switch> for RfKillState {
    fn from(s: Switch) -> Self {
        match s {
            Switch::On => RfKillState::On,
            Switch::Off => RfKillState::Off,
            Switch::Query => RfKillState::Query,
        }
    }
}

#[derive(Serialize)]
struct RfkillOutput {
    hardware: &'static str,
    software: &'static str,
}

fn position(on: bool) -> &'static str {
    if on { "on" } else { "off" }
}

impl RfkillCmd {
    pub fn run(&self, session: &mut WmxSession, format: OutputFormat) -> anyhow::Result<()> {
        let requested = RfKillState::from(self.state);
        let status = session.rfkill(requested)?;

        let out = RfkillOutput {
            hardware: position(status.hardware_on()),
            software: position(status.software_on()),
        };
        if format.is_json() {
            format.print_json(&out)?;
        } else {
            println!("hardware {} software {}", out.hardware, out.software);
        }

        if !status.matches(requested) {
            anyhow::bail!(
                "software switch is {} after the request (status {:#04b})",
                out.software,
                status.bits()
            );
        }
        Ok(())
    }
}
