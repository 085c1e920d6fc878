//! Session configuration.

use std::fmt;
use std::sync::Arc;

use crate::log::{LogSink, TracingSink};
use crate::types::ProtocolVersion;
use crate::wimax::{FAMILY_PREFIX, GNL_VERSION};

/// Settings applied when opening a session.
///
/// # Example
///
/// ```
/// use wmxlink::{ProtocolVersion, SessionConfig};
///
/// let config = SessionConfig::new()
///     .expected_version(ProtocolVersion::new(1, 0))
///     .probe_device(false);
/// assert_eq!(config.version().major, 1);
/// ```
#[derive(Clone)]
pub struct SessionConfig {
    family_prefix: String,
    expected_version: ProtocolVersion,
    probe_device: bool,
    log_sink: Arc<dyn LogSink>,
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Family name prefix (default `"WiMAX"`).
    pub fn family_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.family_prefix = prefix.into();
        self
    }

    /// Interface version the kernel must be compatible with.
    pub fn expected_version(mut self, version: ProtocolVersion) -> Self {
        self.expected_version = version;
        self
    }

    /// Probe a device-bound session with a radio-kill query on open so a
    /// device that does not answer fails early (default on).
    pub fn probe_device(mut self, probe: bool) -> Self {
        self.probe_device = probe;
        self
    }

    /// Where diagnostics go (default: `tracing`).
    pub fn log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.log_sink = sink;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.family_prefix
    }

    pub fn version(&self) -> ProtocolVersion {
        self.expected_version
    }

    pub fn probes(&self) -> bool {
        self.probe_device
    }

    pub fn sink(&self) -> &Arc<dyn LogSink> {
        &self.log_sink
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            family_prefix: FAMILY_PREFIX.to_string(),
            expected_version: GNL_VERSION,
            probe_device: true,
            log_sink: Arc::new(TracingSink),
        }
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("family_prefix", &self.family_prefix)
            .field("expected_version", &self.expected_version)
            .field("probe_device", &self.probe_device)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.prefix(), "WiMAX");
        assert_eq!(config.version(), ProtocolVersion::new(0, 1));
        assert!(config.probes());
    }

    #[test]
    fn test_builder() {
        let config = SessionConfig::new()
            .family_prefix("WiMAX-test")
            .probe_device(false);
        assert_eq!(config.prefix(), "WiMAX-test");
        assert!(!config.probes());
        assert!(format!("{:?}", config).contains("WiMAX-test"));
    }
}
