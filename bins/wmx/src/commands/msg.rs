//! Opaque driver message commands.

use clap::Args;
use serde::Serialize;
use wmxlink::PipeFilter;

use super::WmxSession;
use crate::output::{OutputFormat, hex_decode, hex_dump, hex_encode};

#[derive(Args)]
pub struct ReadCmd {
    /// Only messages on this pipe (default pipe if omitted).
    pub pipe: Option<String>,

    /// Accept messages on any pipe.
    #[arg(short = 'a', long, conflicts_with = "pipe")]
    pub any: bool,

    /// Stop after this many messages (0 reads forever).
    #[arg(short = 'c', long, default_value_t = 1)]
    pub count: usize,
}

#[derive(Serialize)]
struct MessageOutput {
    bytes: usize,
    data: String,
}

impl ReadCmd {
    fn filter(&self) -> PipeFilter<'_> {
        match (&self.pipe, self.any) {
            (_, true) => PipeFilter::Any,
            (Some(name), false) => PipeFilter::Named(name),
            (None, false) => PipeFilter::Default,
        }
    }

    pub fn run(&self, session: &mut WmxSession, format: OutputFormat) -> anyhow::Result<()> {
        let filter = self.filter();
        let mut read = 0;
        while self.count == 0 || read < self.count {
            let data = session.msg_read(filter)?;
            read += 1;
            if format.is_json() {
                format.print_json(&MessageOutput {
                    bytes: data.len(),
                    data: hex_encode(&data),
                })?;
            } else {
                println!("{} bytes", data.len());
                print!("{}", hex_dump(&data));
            }
        }
        Ok(())
    }
}

#[derive(Args)]
pub struct WriteCmd {
    /// Pipe to tag the message with.
    #[arg(long)]
    pub pipe: Option<String>,

    /// Treat the payload as hex digits.
    #[arg(short = 'x', long)]
    pub hex: bool,

    /// Message payload.
    pub data: String,
}

impl WriteCmd {
    pub fn run(&self, session: &mut WmxSession) -> anyhow::Result<()> {
        let payload = if self.hex {
            hex_decode(&self.data)?
        } else {
            self.data.as_bytes().to_vec()
        };
        session.msg_write(self.pipe.as_deref(), &payload)?;
        tracing::debug!(bytes = payload.len(), pipe = ?self.pipe, "message sent");
        Ok(())
    }
}
