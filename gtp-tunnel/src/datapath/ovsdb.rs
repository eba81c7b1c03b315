//! ovsdb - read OVS state through the ovs-vsctl / ovsdb-client tools

use super::command::{CommandRunner, to_args};
use crate::PortName;
use slog::{Logger, debug, error, warn};
use std::fmt;

const OVS_PROBE_COMMAND: [&str; 3] = ["ovs-vsctl", "list", "Open_vSwitch"];
const OVSDB_PORT_DUMP_COMMAND: [&str; 5] = ["ovsdb-client", "dump", "Interface", "name", "ofport"];

/// OVS interface type used for GTP ports.  Upstream OVS renamed "gtp" to "gtpu".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OvsGtpType {
    Gtp,
    Gtpu,
}

impl OvsGtpType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OvsGtpType::Gtp => "gtp",
            OvsGtpType::Gtpu => "gtpu",
        }
    }
}

impl fmt::Display for OvsGtpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ask the switch which GTP interface type it supports.  Falls back to "gtp" if
/// the switch does not advertise "gtpu" or cannot be queried.
pub async fn probe_gtp_type(runner: &dyn CommandRunner, logger: &Logger) -> OvsGtpType {
    match runner.run(&to_args(&OVS_PROBE_COMMAND)).await {
        Ok(output) if output.success() && output.stdout.contains("gtpu") => OvsGtpType::Gtpu,
        Ok(output) => {
            debug!(logger, "ovs-vsctl probe status {}, no gtpu", output.status);
            OvsGtpType::Gtp
        }
        Err(e) => {
            warn!(logger, "Could not probe OVS GTP type - {e:#}");
            OvsGtpType::Gtp
        }
    }
}

/// Read the OpenFlow port number of the named interface from OVSDB.  Returns 0
/// if OVSDB can't be read or has no usable port number for it.
pub async fn query_port_number(runner: &dyn CommandRunner, name: &PortName, logger: &Logger) -> u32 {
    let output = match runner.run(&to_args(&OVSDB_PORT_DUMP_COMMAND)).await {
        Ok(output) => output,
        Err(e) => {
            error!(logger, "Could not read ovsdb - {e:#}");
            return 0;
        }
    };
    if !output.success() {
        error!(logger, "ovsdb-client dump exited with status {}", output.status);
    }
    for line in output.stdout.lines() {
        debug!(logger, "ovsdb: {line}");
    }
    parse_port_number(&output.stdout, name)
}

/// Find `name` in `ovsdb-client dump Interface name ofport` output and parse the
/// port number that follows it.  The dump has one interface per line, the name
/// (optionally quoted) followed by whitespace and the ofport.
pub fn parse_port_number(dump: &str, name: &str) -> u32 {
    dump.lines()
        .find_map(|line| {
            let start = find_token(line, name)?;
            // Skip the name and the character after it (a closing quote or a space).
            let rest = line.get(start + name.len() + 1..).unwrap_or("");
            Some(leading_port_number(rest))
        })
        .unwrap_or(0)
}

// Offset of the first occurrence of `name` that is not part of a longer
// interface name, so that g_100000a does not match g_100000ab.
fn find_token(line: &str, name: &str) -> Option<usize> {
    let is_name_char = |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-';
    line.match_indices(name).map(|(idx, _)| idx).find(|&idx| {
        let before = line[..idx].chars().next_back();
        let after = line[idx + name.len()..].chars().next();
        !before.is_some_and(is_name_char) && !after.is_some_and(is_name_char)
    })
}

// OVS reports -1 (or []) for interfaces that failed to attach; anything that is
// not a positive number is treated as unknown.
fn leading_port_number(s: &str) -> u32 {
    let s = s.trim_start();
    let digits = s.bytes().take_while(u8::is_ascii_digit).count();
    s[..digits].parse().unwrap_or(0)
}
