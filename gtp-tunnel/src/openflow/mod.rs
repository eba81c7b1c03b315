mod end_marker;
mod openflow_tunnel;
mod sdn;
mod tunnel_ops;

pub use end_marker::{EndMarkerEmulator, EndMarkerState};
pub use openflow_tunnel::OpenflowTunnel;
pub use sdn::SdnController;
pub use tunnel_ops::GtpTunnelOps;
