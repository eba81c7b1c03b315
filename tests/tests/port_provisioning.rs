use anyhow::Result;
use gtp_tunnel::{Config, DualStackAddr, OvsGtpType};
use gtp_tunnel_tests::{MockSwitch, framework::*};
use std::net::{Ipv4Addr, Ipv6Addr};

const SCRIPT: &str = "create-gtp-port.sh";
const DUMP: &str = "ovsdb-client";

#[async_std::test]
async fn port_is_created_once_per_peer() -> Result<()> {
    let gw = init().await?;
    let enb: DualStackAddr = Ipv4Addr::new(10, 0, 0, 1).into();

    let port = gw.gtp.ports().resolve(&enb, false).await;
    assert_eq!(port, 1);
    assert_eq!(gw.switch.ofport("g_100000a"), Some(1));
    assert_eq!(
        gw.switch.port_creations(),
        vec![vec![
            gw.config.create_port_script.clone(),
            "g_100000a".to_string(),
            "10.0.0.1".to_string(),
            "false".to_string(),
            "false".to_string(),
            "false".to_string(),
        ]]
    );

    // Second lookup is served from the cache.
    assert_eq!(gw.gtp.ports().resolve(&enb, false).await, 1);
    assert_eq!(gw.switch.count(SCRIPT), 1);
    assert_eq!(gw.switch.count(DUMP), 1);

    let cached = gw.gtp.ports().cached_ports().await;
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].name.as_str(), "g_100000a");
    assert_eq!(cached[0].port_number, 1);
    Ok(())
}

#[async_std::test]
async fn distinct_peers_get_distinct_ports() -> Result<()> {
    let gw = init().await?;
    let enb_1 = Ipv4Addr::new(192, 168, 60, 141).into();
    let enb_2 = Ipv4Addr::new(192, 168, 60, 142).into();

    assert_eq!(gw.gtp.ports().resolve(&enb_1, false).await, 1);
    assert_eq!(gw.gtp.ports().resolve(&enb_2, false).await, 2);
    assert_eq!(gw.gtp.ports().resolve(&enb_1, false).await, 1);
    assert_eq!(gw.switch.ofport("g_8d3ca8c0"), Some(1));
    assert_eq!(gw.switch.ofport("g_8e3ca8c0"), Some(2));
    assert_eq!(gw.switch.count(SCRIPT), 2);
    Ok(())
}

#[async_std::test]
async fn port_cache_grows_past_initial_size() -> Result<()> {
    let gw = init().await?;
    for i in 1..=100u8 {
        let enb = Ipv4Addr::new(10, 1, 0, i).into();
        assert_eq!(gw.gtp.ports().resolve(&enb, false).await, u32::from(i));
    }
    assert_eq!(gw.gtp.ports().cached_ports().await.len(), 100);

    // All still cached.
    let enb = Ipv4Addr::new(10, 1, 0, 42).into();
    assert_eq!(gw.gtp.ports().resolve(&enb, false).await, 42);
    assert_eq!(gw.switch.count(SCRIPT), 100);
    Ok(())
}

#[async_std::test]
async fn single_tunnel_mode_uses_shared_port() -> Result<()> {
    let config = Config {
        multi_tunnel: false,
        ..test_config()
    };
    let gw = init_with(config, MockSwitch::new()).await?;

    let enb = Ipv4Addr::new(10, 0, 0, 1).into();
    assert_eq!(gw.gtp.ports().resolve(&enb, false).await, 0);
    assert_eq!(gw.gtp.gtp_type(), OvsGtpType::Gtp);
    assert!(gw.switch.invocations().is_empty());
    Ok(())
}

#[async_std::test]
async fn unspecified_peer_uses_shared_port() -> Result<()> {
    let gw = init().await?;
    let peer = DualStackAddr::new(Some(Ipv4Addr::UNSPECIFIED), Some(Ipv6Addr::UNSPECIFIED));
    assert_eq!(gw.gtp.ports().resolve(&peer, false).await, 0);
    assert_eq!(gw.gtp.ports().resolve(&DualStackAddr::default(), true).await, 0);
    assert_eq!(gw.switch.count(SCRIPT), 0);
    Ok(())
}

#[async_std::test]
async fn failed_port_creation_is_retried() -> Result<()> {
    let gw = init().await?;
    let enb = Ipv4Addr::new(10, 0, 0, 1).into();

    gw.switch.set_create_fails(true);
    assert_eq!(gw.gtp.ports().resolve(&enb, false).await, 0);
    assert!(gw.gtp.ports().cached_ports().await.is_empty());

    gw.switch.set_create_fails(false);
    assert_eq!(gw.gtp.ports().resolve(&enb, false).await, 1);
    assert_eq!(gw.switch.count(SCRIPT), 2);
    Ok(())
}

#[async_std::test]
async fn unattached_port_is_not_cached() -> Result<()> {
    let gw = init().await?;
    let enb = Ipv4Addr::new(10, 0, 0, 1).into();

    gw.switch.set_attach_fails(true);
    assert_eq!(gw.gtp.ports().resolve(&enb, false).await, 0);
    assert_eq!(gw.switch.ofport("g_100000a"), Some(-1));
    assert_eq!(gw.gtp.ports().resolve(&enb, false).await, 0);
    assert_eq!(gw.switch.count(SCRIPT), 2);
    Ok(())
}

#[async_std::test]
async fn switch_failure_uses_shared_port() -> Result<()> {
    let gw = init().await?;
    gw.switch.set_unreachable(true);
    let enb = Ipv4Addr::new(10, 0, 0, 1).into();
    assert_eq!(gw.gtp.ports().resolve(&enb, false).await, 0);
    Ok(())
}

#[async_std::test]
async fn port_flags_follow_config() -> Result<()> {
    let config = Config {
        gtp_echo: true,
        gtp_csum: true,
        agw_l3_tunnel: true,
        ..test_config()
    };
    let gw = init_with(config, MockSwitch::new()).await?;

    let enb = Ipv4Addr::new(10, 0, 0, 1).into();
    let pgw = Ipv4Addr::new(10, 0, 0, 2).into();
    gw.gtp.ports().resolve(&enb, false).await;
    gw.gtp.ports().resolve(&pgw, true).await;

    let creations = gw.switch.port_creations();
    assert_eq!(creations.len(), 2);
    assert_eq!(creations[0][3..], ["true", "true", "false"]);
    assert_eq!(creations[1][3..], ["true", "true", "true"]);
    Ok(())
}

#[async_std::test]
async fn l3_tunnel_flag_needs_config() -> Result<()> {
    let gw = init().await?;
    let pgw = Ipv4Addr::new(10, 0, 0, 2).into();
    gw.gtp.ports().resolve(&pgw, true).await;
    assert_eq!(gw.switch.port_creations()[0][5], "false");
    Ok(())
}

#[async_std::test]
async fn ipv6_peer() -> Result<()> {
    let gw = init().await?;
    let enb = DualStackAddr::v6("2001:db8::1".parse()?);

    assert_eq!(gw.gtp.ports().resolve(&enb, false).await, 1);
    let creation = &gw.switch.port_creations()[0];
    assert_eq!(creation[1], "g_20010db8000000000000000000000001");
    assert_eq!(creation[2], "2001:db8::1");
    Ok(())
}

#[async_std::test]
async fn dual_stack_peer_prefers_ipv4() -> Result<()> {
    let gw = init().await?;
    let enb = DualStackAddr::new(Some(Ipv4Addr::new(10, 0, 0, 1)), Some("2001:db8::1".parse()?));

    assert_eq!(gw.gtp.ports().resolve(&enb, false).await, 1);
    assert_eq!(gw.switch.port_creations()[0][1], "g_100000a");
    Ok(())
}

#[async_std::test]
async fn gtpu_type_is_probed() -> Result<()> {
    let gw = init_with(test_config(), MockSwitch::new().with_gtpu()).await?;
    assert_eq!(gw.gtp.gtp_type(), OvsGtpType::Gtpu);
    assert_eq!(gw.switch.count("ovs-vsctl"), 1);

    let gw = init().await?;
    assert_eq!(gw.gtp.gtp_type(), OvsGtpType::Gtp);
    Ok(())
}
