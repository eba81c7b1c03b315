use super::command::{CommandRunner, command_line};
use super::ovsdb::{self, OvsGtpType};
use crate::{Config, DualStackAddr, Insertion, PortName, PortRecord, PortTable};
use async_std::sync::Mutex;
use slog::{Logger, debug, error, info, o, warn};
use std::net::IpAddr;
use std::sync::Arc;

/// Finds the OpenFlow port for GTP traffic to a given eNB or PGW, creating a
/// dedicated OVS GTP port for the peer if there isn't one yet.
///
/// A return of 0 tells the OpenFlow controller to use the shared GTP port
/// instead.  This happens when multi tunnel mode is off and whenever a port
/// cannot be created or read back, so OVS failures degrade rather than fail
/// tunnel setup.
pub struct DatapathPortProvisioner {
    multi_tunnel: bool,
    gtp_echo: bool,
    gtp_csum: bool,
    l3_tunnel: bool,
    create_port_script: String,
    gtp_type: OvsGtpType,
    runner: Arc<dyn CommandRunner>,
    ports: Mutex<PortTable>,
    logger: Logger,
}

impl DatapathPortProvisioner {
    /// Probes OVS for its GTP port type if multi tunnel mode is on.
    pub async fn new(config: &Config, runner: Arc<dyn CommandRunner>, logger: &Logger) -> Self {
        let logger = logger.new(o!("component" => "gtp-ports"));
        let gtp_type = if config.multi_tunnel {
            let gtp_type = ovsdb::probe_gtp_type(runner.as_ref(), &logger).await;
            info!(logger, "Using GTP type: {gtp_type}");
            gtp_type
        } else {
            OvsGtpType::Gtp
        };

        DatapathPortProvisioner {
            multi_tunnel: config.multi_tunnel,
            gtp_echo: config.gtp_echo,
            gtp_csum: config.gtp_csum,
            l3_tunnel: config.agw_l3_tunnel,
            create_port_script: config.create_port_script.clone(),
            gtp_type,
            runner,
            ports: Mutex::new(PortTable::new()),
            logger,
        }
    }

    pub fn gtp_type(&self) -> OvsGtpType {
        self.gtp_type
    }

    /// Returns the OpenFlow port number for the peer, or 0 for the shared GTP port.
    /// `is_pgw` selects L3 tunnel mode (if configured) for roaming peers.
    pub async fn resolve(&self, peer: &DualStackAddr, is_pgw: bool) -> u32 {
        if !self.multi_tunnel {
            return 0;
        }
        let Some(peer_ip) = peer.preferred() else {
            warn!(self.logger, "Zero peer IP address not supported");
            return 0;
        };
        let name = PortName::from_ip(peer_ip);

        // Held across port creation so that two tunnels to a new peer create it once.
        let mut ports = self.ports.lock().await;
        let port_number = ports.lookup(&name);
        if port_number != 0 {
            return port_number;
        }

        let port_number = self.create_gtp_port(peer_ip, &name, is_pgw).await;
        match ports.insert(name.clone(), port_number) {
            Insertion::Stored => debug!(self.logger, "Cached {name} -> {port_number}"),
            Insertion::StoredAfterFlush => warn!(
                self.logger,
                "GTP port table overflowed and was flushed; cached {name} -> {port_number}"
            ),
            Insertion::Dropped => debug!(self.logger, "No port number cached for {name}"),
        }
        port_number
    }

    /// Snapshot of the port number cache.
    pub async fn cached_ports(&self) -> Vec<PortRecord> {
        self.ports.lock().await.iter().cloned().collect()
    }

    async fn create_gtp_port(&self, peer_ip: IpAddr, name: &PortName, is_pgw: bool) -> u32 {
        let args = vec![
            self.create_port_script.clone(),
            name.to_string(),
            peer_ip.to_string(),
            flag(self.gtp_echo).to_string(),
            flag(self.gtp_csum).to_string(),
            flag(is_pgw && self.l3_tunnel).to_string(),
        ];

        // Failure is not fatal.  The port number lookup below will come back
        // empty and the peer's traffic falls back to the shared GTP port.
        match self.runner.run(&args).await {
            Ok(output) if output.success() => debug!(
                self.logger,
                "gtp port create done [{}] for peer {peer_ip}",
                command_line(&args)
            ),
            Ok(output) => error!(
                self.logger,
                "gtp port create [{}] failed: {}",
                command_line(&args),
                output.status
            ),
            Err(e) => error!(
                self.logger,
                "gtp port create [{}] failed: {e:#}",
                command_line(&args)
            ),
        }

        let port_number = ovsdb::query_port_number(self.runner.as_ref(), name, &self.logger).await;
        info!(self.logger, "GTP port {name} for peer {peer_ip} is ofport {port_number}");
        port_number
    }
}

fn flag(enabled: bool) -> &'static str {
    if enabled { "true" } else { "false" }
}
