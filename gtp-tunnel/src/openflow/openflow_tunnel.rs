use super::{EndMarkerEmulator, EndMarkerState, GtpTunnelOps, SdnController};
use crate::datapath::{CommandRunner, DatapathPortProvisioner, OvsGtpType};
use crate::fastpath::{FastPathMirror, MapStore};
use crate::{
    Config, DownlinkFlow, DualStackAddr, GtpTunnel, Imsi, S8Tunnel, S8TunnelRef, TunnelRef,
    TunnelResult,
};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use slog::{Logger, error, info};
use std::net::Ipv4Addr;
use std::sync::Arc;

/// GTP tunnels implemented as OpenFlow rules on an OVS bridge, with optional
/// per-peer GTP ports and an optional eBPF downlink fast path.
#[derive(Clone)]
pub struct OpenflowTunnel {
    config: Config,
    sdn: Arc<dyn SdnController>,
    ports: Arc<DatapathPortProvisioner>,
    fast_path: Arc<FastPathMirror>,
    end_marker: Arc<EndMarkerEmulator>,
    logger: Logger,
}

impl OpenflowTunnel {
    /// Start the OpenFlow controller and set up the datapath.  The gateway can't
    /// run without the controller, so failing to start it is an error.
    pub async fn init(
        config: Config,
        sdn: Arc<dyn SdnController>,
        runner: Arc<dyn CommandRunner>,
        map_store: Arc<dyn MapStore>,
        logger: Logger,
    ) -> Result<Self> {
        info!(
            &logger,
            "Init GTP tunnels on {}, UE network {}/{} mtu {}",
            config.bridge_name,
            config.ue_subnet,
            config.ue_netmask_bits,
            config.mtu
        );

        sdn.start(config.persist_state)
            .await
            .map_err(|e| anyhow!("Could not start openflow controller - {e}"))?;

        let ports = DatapathPortProvisioner::new(&config, runner.clone(), &logger).await;
        let fast_path = if config.ebpf_enabled {
            FastPathMirror::open(map_store, &config.ebpf_dl_map_path, &logger)
        } else {
            FastPathMirror::disabled(&logger)
        };
        let end_marker = EndMarkerEmulator::new(&config, runner, &logger);

        Ok(OpenflowTunnel {
            config,
            sdn,
            ports: Arc::new(ports),
            fast_path: Arc::new(fast_path),
            end_marker: Arc::new(end_marker),
            logger,
        })
    }

    pub fn gtp_type(&self) -> OvsGtpType {
        self.ports.gtp_type()
    }

    pub fn ports(&self) -> &DatapathPortProvisioner {
        &self.ports
    }

    pub fn fast_path(&self) -> &FastPathMirror {
        &self.fast_path
    }

    pub fn end_marker_state(&self) -> EndMarkerState {
        self.end_marker.state()
    }
}

#[async_trait]
impl GtpTunnelOps for OpenflowTunnel {
    async fn uninit(&self) -> TunnelResult {
        info!(&self.logger, "Stopping openflow controller");
        self.sdn.stop().await.inspect_err(|e| {
            error!(&self.logger, "Could not stop openflow controller on uninit - {e}")
        })
    }

    async fn reset(&self) -> TunnelResult {
        Ok(())
    }

    async fn add_tunnel(&self, tunnel: &GtpTunnel) -> TunnelResult {
        let enb_port = self.ports.resolve(&tunnel.enb, false).await;

        if let Err(e) = self
            .fast_path
            .add_entry(&tunnel.ue, &tunnel.enb, tunnel.o_tei, &tunnel.imsi)
        {
            error!(&self.logger, "{e:#}");
        }

        info!(&self.logger, "Add tunnel {tunnel} on port {enb_port}");
        self.sdn.add_gtp_tunnel(tunnel, enb_port).await
    }

    async fn del_tunnel(&self, tunnel: &TunnelRef) -> TunnelResult {
        let enb_port = self.ports.resolve(&tunnel.enb, false).await;

        if let Err(e) = self.fast_path.delete_entry(&tunnel.ue, &tunnel.enb) {
            error!(&self.logger, "{e:#}");
        }

        info!(
            &self.logger,
            "Delete tunnel (ue {} {:x}) on port {enb_port}", tunnel.ue, tunnel.i_tei
        );
        self.sdn.del_gtp_tunnel(tunnel, enb_port).await
    }

    async fn add_s8_tunnel(&self, tunnel: &S8Tunnel) -> TunnelResult {
        let enb_port = self.ports.resolve(&tunnel.enb, false).await;
        let pgw_port = self.ports.resolve(&tunnel.pgw, true).await;

        info!(
            &self.logger,
            "Add S8 tunnel {tunnel} on ports {enb_port}/{pgw_port}"
        );
        self.sdn.add_s8_tunnel(tunnel, enb_port, pgw_port).await
    }

    async fn del_s8_tunnel(&self, tunnel: &S8TunnelRef) -> TunnelResult {
        let enb_port = self.ports.resolve(&tunnel.enb, false).await;
        let pgw_port = self.ports.resolve(&tunnel.pgw, true).await;

        info!(
            &self.logger,
            "Delete S8 tunnel (ue {} {:x}) on ports {enb_port}/{pgw_port}", tunnel.ue, tunnel.i_tei
        );
        self.sdn.del_s8_tunnel(tunnel, enb_port, pgw_port).await
    }

    async fn discard_data_on_tunnel(
        &self,
        ue: &DualStackAddr,
        i_tei: u32,
        flow_dl: Option<&DownlinkFlow>,
    ) -> TunnelResult {
        self.sdn.discard_data_on_tunnel(ue, i_tei, flow_dl).await
    }

    async fn forward_data_on_tunnel(
        &self,
        ue: &DualStackAddr,
        i_tei: u32,
        flow_dl: Option<&DownlinkFlow>,
        flow_precedence_dl: u32,
    ) -> TunnelResult {
        self.sdn
            .forward_data_on_tunnel(ue, i_tei, flow_dl, flow_precedence_dl)
            .await
    }

    async fn add_paging_rule(&self, imsi: &Imsi, ue: &DualStackAddr) -> TunnelResult {
        self.sdn.add_paging_rule(imsi, ue).await
    }

    async fn delete_paging_rule(&self, ue: &DualStackAddr) -> TunnelResult {
        self.sdn.delete_paging_rule(ue).await
    }

    async fn send_end_marker(&self, enb: Ipv4Addr, tei: u32) -> TunnelResult {
        self.end_marker.send(enb, tei).await
    }

    fn get_dev_name(&self) -> &str {
        &self.config.bridge_name
    }
}
