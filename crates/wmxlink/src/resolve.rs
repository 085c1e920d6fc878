//! Family and version resolution.

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::log::{Level, Logger};
use crate::netlink::genl::{FamilyInfo, family_request, parse_family};
use crate::netlink::message::{MessageIter, NlMsgError};
use crate::transport::Channel;
use crate::types::{Interface, ProtocolVersion};

/// Outcome of comparing the kernel's interface version with ours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionCheck {
    /// Fully compatible.
    Compatible,
    /// Same major, but the kernel's minor is older than expected. Usable,
    /// some features may be missing.
    OlderMinor,
}

/// Compare versions: a major mismatch is fatal, an older minor only warns.
pub fn check_version(found: ProtocolVersion, expected: ProtocolVersion) -> Result<VersionCheck> {
    if found.major != expected.major {
        return Err(Error::VersionMismatch { found, expected });
    }
    if found.minor < expected.minor {
        Ok(VersionCheck::OlderMinor)
    } else {
        Ok(VersionCheck::Compatible)
    }
}

/// Family names to try, most specific first.
pub fn family_names(prefix: &str, iface: Option<&Interface>) -> Vec<String> {
    match iface {
        Some(iface) => vec![format!("{} {}", prefix, iface.index), prefix.to_string()],
        None => vec![prefix.to_string()],
    }
}

/// A family the session can talk to.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedFamily {
    pub(crate) name: String,
    pub(crate) info: FamilyInfo,
    pub(crate) version: ProtocolVersion,
    pub(crate) check: VersionCheck,
}

/// Ask the control family for `name`. `Ok(None)` if it is not registered.
pub(crate) fn query_family<C: Channel>(
    chan: &mut C,
    name: &str,
    seq: u32,
) -> Result<Option<FamilyInfo>> {
    chan.send(&family_request(name, seq, chan.port_id()))?;

    let mut info = None;
    loop {
        let data = chan.recv()?;
        for result in MessageIter::new(&data) {
            let (header, payload) = result?;

            if header.nlmsg_seq != seq {
                continue;
            }

            if header.is_error() {
                let err = NlMsgError::read(payload)?;
                if err.is_ack() {
                    return Ok(info);
                }
                // ENOENT means family not registered
                if err.error == -libc::ENOENT {
                    return Ok(None);
                }
                return Err(Error::from_errno(err.error));
            }

            if header.is_done() || header.is_control() {
                continue;
            }

            info = Some(parse_family(payload)?);
        }
    }
}

/// Find the WiMAX family for `iface` and gate on its version.
///
/// `next_seq` hands out one sequence number per lookup.
pub(crate) fn resolve_family<C: Channel>(
    chan: &mut C,
    iface: Option<&Interface>,
    config: &SessionConfig,
    log: &Logger,
    mut next_seq: impl FnMut() -> u32,
) -> Result<ResolvedFamily> {
    let names = family_names(config.prefix(), iface);
    for name in &names {
        let Some(info) = query_family(chan, name, next_seq())? else {
            log.log(Level::Debug, format_args!("generic netlink family \"{}\" not registered", name));
            continue;
        };

        let version = ProtocolVersion::from_wire(info.version);
        let expected = config.version();
        let check = match check_version(version, expected) {
            Ok(check) => check,
            Err(e) => {
                log.log(
                    Level::Error,
                    format_args!(
                        "kernel's major WiMAX GNL interface version ({}) differs from supported {}; aborting",
                        version.major, expected.major
                    ),
                );
                return Err(e);
            }
        };
        if check == VersionCheck::OlderMinor {
            log.log(
                Level::Warn,
                format_args!(
                    "kernel's minor WiMAX GNL interface version ({}) is lower than supported {}; things might not work",
                    version.minor, expected.minor
                ),
            );
        }

        log.log(
            Level::Debug,
            format_args!("family \"{}\" id {} version {}", name, info.id, version),
        );
        return Ok(ResolvedFamily {
            name: name.clone(),
            info,
            version,
            check,
        });
    }

    log.log(
        Level::Error,
        format_args!("can't find kernel's WiMAX API over generic netlink ({})", names.join(", ")),
    );
    Err(Error::ProtocolUnavailable(format!(
        "no generic netlink family {}",
        names.join(" or ")
    )))
}
