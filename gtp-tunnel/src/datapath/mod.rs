mod command;
mod ovsdb;
mod provisioner;

pub use command::{CommandOutput, CommandRunner, ProcessRunner, command_line, to_args};
pub use ovsdb::{OvsGtpType, parse_port_number, probe_gtp_type, query_port_number};
pub use provisioner::DatapathPortProvisioner;
