use crate::{
    DownlinkFlow, DualStackAddr, GtpTunnel, Imsi, S8Tunnel, S8TunnelRef, TunnelRef, TunnelResult,
};
use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Trait representing the GTP tunnel operations offered to session management.
#[async_trait]
pub trait GtpTunnelOps: Send + Sync + 'static {
    async fn uninit(&self) -> TunnelResult;
    async fn reset(&self) -> TunnelResult;

    async fn add_tunnel(&self, tunnel: &GtpTunnel) -> TunnelResult;
    async fn del_tunnel(&self, tunnel: &TunnelRef) -> TunnelResult;

    async fn add_s8_tunnel(&self, tunnel: &S8Tunnel) -> TunnelResult;
    async fn del_s8_tunnel(&self, tunnel: &S8TunnelRef) -> TunnelResult;

    async fn discard_data_on_tunnel(
        &self,
        ue: &DualStackAddr,
        i_tei: u32,
        flow_dl: Option<&DownlinkFlow>,
    ) -> TunnelResult;
    async fn forward_data_on_tunnel(
        &self,
        ue: &DualStackAddr,
        i_tei: u32,
        flow_dl: Option<&DownlinkFlow>,
        flow_precedence_dl: u32,
    ) -> TunnelResult;

    async fn add_paging_rule(&self, imsi: &Imsi, ue: &DualStackAddr) -> TunnelResult;
    async fn delete_paging_rule(&self, ue: &DualStackAddr) -> TunnelResult;

    async fn send_end_marker(&self, enb: Ipv4Addr, tei: u32) -> TunnelResult;

    fn get_dev_name(&self) -> &str;
}
