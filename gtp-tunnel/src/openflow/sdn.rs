use crate::{
    DownlinkFlow, DualStackAddr, GtpTunnel, Imsi, S8Tunnel, S8TunnelRef, TunnelRef, TunnelResult,
};
use async_trait::async_trait;

/// Control channel to the OpenFlow controller that owns the GTP bridge's flow
/// tables.  Port numbers of 0 select the shared GTP port.  Failures are
/// reported as [`crate::TunnelError::Controller`] carrying the controller's status.
#[async_trait]
pub trait SdnController: Send + Sync + 'static {
    async fn start(&self, persist_state: bool) -> TunnelResult;
    async fn stop(&self) -> TunnelResult;

    async fn add_gtp_tunnel(&self, tunnel: &GtpTunnel, enb_port: u32) -> TunnelResult;
    async fn del_gtp_tunnel(&self, tunnel: &TunnelRef, enb_port: u32) -> TunnelResult;

    async fn add_s8_tunnel(&self, tunnel: &S8Tunnel, enb_port: u32, pgw_port: u32)
    -> TunnelResult;
    async fn del_s8_tunnel(
        &self,
        tunnel: &S8TunnelRef,
        enb_port: u32,
        pgw_port: u32,
    ) -> TunnelResult;

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
}
