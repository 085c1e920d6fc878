//! Interface name and index resolution through sysfs.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::{Device, Interface};

/// Maximum interface name length (including null terminator).
pub const IFNAMSIZ: usize = 16;

/// Default location of the per-interface sysfs directories.
pub const SYSFS_NET: &str = "/sys/class/net";

/// Check that `name` could be a kernel interface name.
pub fn is_valid(name: &str) -> bool {
    !name.is_empty()
        && name.len() < IFNAMSIZ
        && !name.contains(['/', '\0'])
        && !name.chars().any(char::is_whitespace)
}

/// Interface lookup rooted at a sysfs `class/net` directory.
#[derive(Debug, Clone)]
pub struct SysfsNet {
    root: PathBuf,
}

impl SysfsNet {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Convert an interface name to its index.
    pub fn name_to_index(&self, name: &str) -> Option<u32> {
        if !is_valid(name) {
            return None;
        }
        let content = std::fs::read_to_string(self.root.join(name).join("ifindex")).ok()?;
        content.trim().parse().ok()
    }

    /// Convert an interface index to its name.
    pub fn index_to_name(&self, index: u32) -> Option<String> {
        if index == 0 {
            return None;
        }
        let entries = std::fs::read_dir(&self.root).ok()?;
        entries.flatten().find_map(|entry| {
            let content = std::fs::read_to_string(entry.path().join("ifindex")).ok()?;
            (content.trim().parse::<u32>().ok()? == index)
                .then(|| entry.file_name().to_string_lossy().into_owned())
        })
    }

    /// Resolve a device to a live interface; `Device::Any` resolves to
    /// `None`.
    pub fn resolve(&self, device: &Device) -> Result<Option<Interface>> {
        let found = match device {
            Device::Any => return Ok(None),
            Device::Name(name) => self.name_to_index(name).map(|index| Interface {
                name: name.clone(),
                index,
            }),
            Device::Index(index) => self.index_to_name(*index).map(|name| Interface {
                name,
                index: *index,
            }),
        };
        found.map(Some).ok_or_else(|| Error::NoSuchDevice {
            device: device.to_string(),
        })
    }
}

impl Default for SysfsNet {
    fn default() -> Self {
        Self::new(SYSFS_NET)
    }
}
