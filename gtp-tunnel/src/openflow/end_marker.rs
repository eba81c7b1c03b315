use crate::datapath::{CommandRunner, command_line};
use crate::{Config, TunnelError, TunnelResult};
use hex_literal::hex;
use slog::{Logger, debug, error, o};
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

// Any Ethernet frame will do; packet-out needs something to carry the tunnel metadata.
const PACKET_OUT_FRAME: [u8; 14] = hex!("50 54 00 00 00 0a 50 54 00 00 00 00 80 00");

const GTP_MESSAGE_TYPE_END_MARKER: u8 = 254; // TS29.281, table 6.1-1
const GTP_FLAGS: u8 = 0x30; // version 1, PT=1

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndMarkerState {
    Supported,
    PermanentlyDisabled,
}

/// Sends GTP end markers to an eNB by injecting a packet-out on the GTP bridge.
///
/// This relies on an OVS patch that not every switch has.  The first failed
/// attempt disables end markers for the rest of the process lifetime.
pub struct EndMarkerEmulator {
    bridge_name: String,
    gtp_port_name: String,
    supported: AtomicBool,
    runner: Arc<dyn CommandRunner>,
    logger: Logger,
}

impl EndMarkerEmulator {
    pub fn new(config: &Config, runner: Arc<dyn CommandRunner>, logger: &Logger) -> Self {
        EndMarkerEmulator {
            bridge_name: config.bridge_name.clone(),
            gtp_port_name: config.gtp_port_name.clone(),
            supported: AtomicBool::new(true),
            runner,
            logger: logger.new(o!("component" => "end-marker")),
        }
    }

    pub fn state(&self) -> EndMarkerState {
        if self.supported.load(Ordering::Acquire) {
            EndMarkerState::Supported
        } else {
            EndMarkerState::PermanentlyDisabled
        }
    }

    pub async fn send(&self, enb: Ipv4Addr, tei: u32) -> TunnelResult {
        if self.state() == EndMarkerState::PermanentlyDisabled {
            return Err(TunnelError::NoDevice);
        }

        // Nothing to mark on a tunnel that never got its remote endpoint.
        if tei == 0 || enb.is_unspecified() {
            return Ok(());
        }

        let args = self.packet_out_command(enb, tei);
        let failure = match self.runner.run(&args).await {
            Ok(output) if output.success() => {
                debug!(self.logger, "End marker sent: tei {tei} tun_dst {enb}");
                return Ok(());
            }
            Ok(output) => format!("exit status {}", output.status),
            Err(e) => format!("{e:#}"),
        };

        error!(
            self.logger,
            "end marker cmd [{}] failed: {failure} - disabling end markers",
            command_line(&args)
        );
        self.supported.store(false, Ordering::Release);
        Err(TunnelError::EndMarker(failure))
    }

    fn packet_out_command(&self, enb: Ipv4Addr, tei: u32) -> Vec<String> {
        let packet_out = format!(
            "in_port=local packet={},actions=load:{tei}->tun_id[0..31],set_field:{enb}->tun_dst,\
             set_field:{GTP_MESSAGE_TYPE_END_MARKER:#x}->tun_gtpu_msgtype,\
             set_field:{GTP_FLAGS:#x}->tun_gtpu_flags,output:{}",
            hex::encode(PACKET_OUT_FRAME),
            self.gtp_port_name
        );
        vec![
            "ovs-ofctl".to_string(),
            "packet-out".to_string(),
            self.bridge_name.clone(),
            packet_out,
        ]
    }
}
