mod data;
mod datapath;
mod error;
mod fastpath;
mod openflow;

pub use data::*;
pub use datapath::{
    CommandOutput, CommandRunner, DatapathPortProvisioner, OvsGtpType, ProcessRunner,
    command_line, parse_port_number, probe_gtp_type, query_port_number, to_args,
};
pub use error::{TunnelError, TunnelResult};
pub use fastpath::{
    BpfMapStore, DL_MAP_KEY_LEN, DL_MAP_VALUE_LEN, DlMapEntry, DlMapKey, DlMapValue,
    FastPathMirror, InMemoryMapStore, MapHandle, MapStore, UpdateFlags,
};
pub use openflow::{EndMarkerEmulator, EndMarkerState, GtpTunnelOps, OpenflowTunnel, SdnController};
