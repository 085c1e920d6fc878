//! Injectable diagnostics sink.
//!
//! Sessions never log through global state; every diagnostic goes through
//! the [`LogSink`] held in the session's configuration. The default sink
//! forwards to `tracing`.

use std::fmt;
use std::sync::Arc;

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Receiver of session diagnostics.
pub trait LogSink: Send + Sync {
    /// Record one message. `device` is the session's interface name, or
    /// `"any"`.
    fn log(&self, level: Level, device: &str, args: fmt::Arguments<'_>);
}

/// Sink forwarding to the `tracing` macros with the device as a field.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, level: Level, device: &str, args: fmt::Arguments<'_>) {
        match level {
            Level::Error => tracing::error!(device, "{}", args),
            Level::Warn => tracing::warn!(device, "{}", args),
            Level::Info => tracing::info!(device, "{}", args),
            Level::Debug => tracing::debug!(device, "{}", args),
            Level::Trace => tracing::trace!(device, "{}", args),
        }
    }
}

/// Sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl LogSink for NullSink {
    fn log(&self, _level: Level, _device: &str, _args: fmt::Arguments<'_>) {}
}

/// A sink bound to one session's device name.
#[derive(Clone)]
pub(crate) struct Logger {
    sink: Arc<dyn LogSink>,
    device: String,
}

impl Logger {
    pub(crate) fn new(sink: Arc<dyn LogSink>, device: impl Into<String>) -> Self {
        Self {
            sink,
            device: device.into(),
        }
    }

    pub(crate) fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        self.sink.log(level, &self.device, args);
    }
}
