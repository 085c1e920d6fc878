//! wmx command - WiMAX device control.

mod commands;
mod output;

use clap::{Parser, Subcommand};
use wmxlink::{Device, NetlinkTransport, Session, SessionConfig};

use output::OutputFormat;

#[derive(Parser)]
#[command(name = "wmx", version, about = "WiMAX device control tool")]
struct Cli {
    /// Interface name, `#<ifindex>`, or `any` for every device.
    #[arg(short = 'i', long, default_value = "wmx0")]
    interface: String,

    /// Output JSON.
    #[arg(short = 'j', long)]
    json: bool,

    /// Pretty print JSON.
    #[arg(short = 'p', long)]
    pretty: bool,

    /// Skip the radio-kill probe when opening the device.
    #[arg(long)]
    no_probe: bool,

    /// More logging (repeat for more).
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the generic netlink family and its channels.
    Info,

    /// Reset the device.
    Reset,

    /// Set or query the radio-kill switch.
    #[command(visible_alias = "rf")]
    Rfkill(commands::rfkill::RfkillCmd),

    /// Show the device state.
    #[command(visible_alias = "st")]
    State,

    /// Wait for the next state change.
    #[command(visible_alias = "wait")]
    WaitStateChange,

    /// Read opaque messages sent by the driver.
    MsgRead(commands::msg::ReadCmd),

    /// Send an opaque message to the driver.
    MsgWrite(commands::msg::WriteCmd),

    /// Watch driver notifications.
    #[command(visible_alias = "mon")]
    Monitor(commands::monitor::MonitorCmd),
}

fn log_level(verbose: u8) -> tracing::Level {
    match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(log_level(cli.verbose).into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let format = if cli.json {
        OutputFormat::Json { pretty: cli.pretty }
    } else {
        OutputFormat::Text
    };

    let device = match cli.interface.as_str() {
        "any" => Device::Any,
        other => Device::parse(other),
    };
    let config = SessionConfig::new().probe_device(!cli.no_probe);
    let mut session = Session::open(NetlinkTransport::new(), device, config)?;

    let result = match cli.command {
        Command::Info => commands::device::info(&session, format),
        Command::Reset => commands::device::reset(&mut session),
        Command::Rfkill(cmd) => cmd.run(&mut session, format),
        Command::State => commands::device::state(&mut session, format),
        Command::WaitStateChange => commands::device::wait_state_change(&mut session, format),
        Command::MsgRead(cmd) => cmd.run(&mut session, format),
        Command::MsgWrite(cmd) => cmd.run(&mut session),
        Command::Monitor(cmd) => cmd.run(&mut session, format).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
