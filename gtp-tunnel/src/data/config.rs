use anyhow::Result;
use serde::Deserialize;
use slog::{Logger, error, info};
use std::fs;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    // OVS bridge carrying GTP traffic.
    pub bridge_name: String,

    // Shared GTP port, used for every peer when multi tunnel mode is off and as the
    // end marker output port.
    pub gtp_port_name: String,

    // Create a GTP port per eNB / PGW rather than sharing gtp_port_name.
    pub multi_tunnel: bool,

    // Options passed to the port creation script.
    pub gtp_echo: bool,
    pub gtp_csum: bool,
    pub agw_l3_tunnel: bool,

    // Mirror downlink tunnels into the eBPF fast path map pinned at ebpf_dl_map_path.
    pub ebpf_enabled: bool,
    pub ebpf_dl_map_path: PathBuf,

    pub create_port_script: String,

    // Prefix OVS commands with sudo.
    pub use_sudo: bool,

    // Kill OVS commands that take longer than this.  No limit if unset.
    pub command_timeout_ms: Option<u64>,

    // Ask the OpenFlow controller to keep flows across restarts.
    pub persist_state: bool,

    // UE network.  Informational only; routing is programmed by the SDN controller.
    pub ue_subnet: Ipv4Addr,
    pub ue_netmask_bits: u8,
    pub mtu: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bridge_name: "gtp_br0".to_string(),
            gtp_port_name: "gtp0".to_string(),
            multi_tunnel: false,
            gtp_echo: false,
            gtp_csum: false,
            agw_l3_tunnel: false,
            ebpf_enabled: false,
            ebpf_dl_map_path: PathBuf::from("/sys/fs/bpf/dl_map"),
            create_port_script: "/usr/local/bin/magma-create-gtp-port.sh".to_string(),
            use_sudo: false,
            command_timeout_ms: None,
            persist_state: false,
            ue_subnet: Ipv4Addr::new(192, 168, 128, 0),
            ue_netmask_bits: 24,
            mtu: 1400,
        }
    }
}

impl Config {
    /// Load the configuration from a TOML file.  Missing fields take their defaults.
    pub fn load(filename: &str, logger: &Logger) -> Result<Config> {
        let contents = fs::read_to_string(filename).inspect_err(|e| {
            error!(logger, "Failed to load config file {filename} with error {e}")
        })?;
        let config: Config = toml::from_str(&contents)
            .inspect_err(|e| error!(logger, "Failed to parse config file {filename}: {e}"))?;
        info!(
            logger,
            "Loaded config from {filename}: bridge {} multi_tunnel {} ebpf {}",
            config.bridge_name,
            config.multi_tunnel,
            config.ebpf_enabled
        );
        Ok(config)
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_ms.map(Duration::from_millis)
    }
}
