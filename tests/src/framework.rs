use super::{MockSdn, MockSwitch};
use anyhow::Result;
use gtp_tunnel::{
    Config, DualStackAddr, GtpTunnel, InMemoryMapStore, MapStore, OpenflowTunnel, S8Tunnel,
    S8TunnelRef, TunnelRef,
};
use slog::{Drain, Logger, o};
use std::net::Ipv4Addr;
use std::sync::Arc;

pub const TEST_IMSI: &str = "001010000000001";

pub struct TestGateway {
    pub gtp: OpenflowTunnel,
    pub sdn: Arc<MockSdn>,
    pub switch: Arc<MockSwitch>,
    pub maps: Arc<InMemoryMapStore>,
    pub config: Config,
    pub logger: Logger,
}

impl TestGateway {
    /// Number of entries in the pinned downlink map.
    pub fn dl_map_len(&self) -> Result<usize> {
        let handle = self.maps.get_handle(&self.config.ebpf_dl_map_path)?;
        self.maps.len(handle)
    }
}

/// Multi tunnel mode and the eBPF downlink map both on.
pub fn test_config() -> Config {
    Config {
        multi_tunnel: true,
        ebpf_enabled: true,
        ..Config::default()
    }
}

pub async fn init() -> Result<TestGateway> {
    init_with(test_config(), MockSwitch::new()).await
}

pub async fn init_with(config: Config, switch: MockSwitch) -> Result<TestGateway> {
    exit_on_panic();
    let logger = init_logging();
    let sdn = Arc::new(MockSdn::new());
    let switch = Arc::new(switch);
    let maps = Arc::new(InMemoryMapStore::new());
    maps.pin(&config.ebpf_dl_map_path)?;

    let gtp = OpenflowTunnel::init(
        config.clone(),
        sdn.clone(),
        switch.clone(),
        maps.clone(),
        logger.new(o!("gtp" => 1)),
    )
    .await?;

    Ok(TestGateway {
        gtp,
        sdn,
        switch,
        maps,
        config,
        logger,
    })
}

fn exit_on_panic() {
    let orig_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        orig_hook(panic_info);
        std::process::exit(1);
    }));
}

pub fn init_logging() -> Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::CompactFormat::new(decorator).build();
    let drain = std::sync::Mutex::new(drain).fuse();
    let drain = slog_envlogger::new(drain);
    slog::Logger::root(drain, o!())
}

pub fn gtp_tunnel(ue: Ipv4Addr, enb: Ipv4Addr, i_tei: u32, o_tei: u32) -> GtpTunnel {
    GtpTunnel {
        ue: ue.into(),
        enb: enb.into(),
        vlan: None,
        i_tei,
        o_tei,
        imsi: TEST_IMSI.parse().unwrap(),
        flow_dl: None,
        flow_precedence_dl: 0,
        apn: Some("internet".to_string()),
    }
}

pub fn tunnel_ref(tunnel: &GtpTunnel) -> TunnelRef {
    TunnelRef {
        ue: tunnel.ue,
        enb: tunnel.enb,
        i_tei: tunnel.i_tei,
        flow_dl: tunnel.flow_dl.clone(),
    }
}

pub fn s8_tunnel(ue: Ipv4Addr, enb: Ipv4Addr, pgw: Ipv4Addr, i_tei: u32) -> S8Tunnel {
    S8Tunnel {
        ue: ue.into(),
        enb: enb.into(),
        pgw: pgw.into(),
        vlan: None,
        i_tei,
        o_tei: i_tei + 1,
        pgw_i_tei: i_tei + 2,
        pgw_o_tei: i_tei + 3,
        imsi: TEST_IMSI.parse().unwrap(),
    }
}

pub fn s8_tunnel_ref(tunnel: &S8Tunnel) -> S8TunnelRef {
    S8TunnelRef {
        ue: tunnel.ue,
        enb: tunnel.enb,
        pgw: tunnel.pgw,
        i_tei: tunnel.i_tei,
        pgw_i_tei: tunnel.pgw_i_tei,
    }
}

pub fn ue_addr(last_octet: u8) -> DualStackAddr {
    Ipv4Addr::new(192, 168, 128, last_octet).into()
}
