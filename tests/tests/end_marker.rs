use anyhow::Result;
use gtp_tunnel::{EndMarkerState, GtpTunnelOps, TunnelError};
use gtp_tunnel_tests::framework::*;
use std::net::Ipv4Addr;

const ENB: Ipv4Addr = Ipv4Addr::new(192, 168, 60, 141);

#[async_std::test]
async fn end_marker_sent() -> Result<()> {
    let gw = init().await?;
    gw.gtp.send_end_marker(ENB, 0x1234).await?;

    let packet_outs: Vec<_> = gw
        .switch
        .invocations()
        .into_iter()
        .filter(|args| args[0] == "ovs-ofctl")
        .collect();
    assert_eq!(packet_outs.len(), 1);
    assert_eq!(packet_outs[0][1..3], ["packet-out", "gtp_br0"]);
    assert!(packet_outs[0][3].contains("load:4660->tun_id[0..31]"));
    assert!(packet_outs[0][3].contains("set_field:192.168.60.141->tun_dst"));
    assert!(packet_outs[0][3].ends_with("output:gtp0"));
    assert_eq!(gw.gtp.end_marker_state(), EndMarkerState::Supported);
    Ok(())
}

#[async_std::test]
async fn end_marker_without_tunnel_is_skipped() -> Result<()> {
    let gw = init().await?;
    gw.gtp.send_end_marker(ENB, 0).await?;
    gw.gtp.send_end_marker(Ipv4Addr::UNSPECIFIED, 0x1234).await?;
    assert_eq!(gw.switch.count("ovs-ofctl"), 0);
    Ok(())
}

#[async_std::test]
async fn failure_disables_end_markers() -> Result<()> {
    let gw = init().await?;
    gw.switch.set_packet_out_fails(true);

    let err = gw.gtp.send_end_marker(ENB, 0x1234).await.unwrap_err();
    assert!(matches!(err, TunnelError::EndMarker(_)));
    assert!(err.status() < 0);
    assert_eq!(
        gw.gtp.end_marker_state(),
        EndMarkerState::PermanentlyDisabled
    );

    // Stays off even once the switch would accept it, and nothing more is sent.
    gw.switch.set_packet_out_fails(false);
    let err = gw.gtp.send_end_marker(ENB, 0x5678).await.unwrap_err();
    assert_eq!(err, TunnelError::NoDevice);
    assert_eq!(err.status(), -libc::ENODEV);
    assert_eq!(gw.switch.count("ovs-ofctl"), 1);

    // A tunnel with no TEI reports the disabled state too.
    assert_eq!(
        gw.gtp.send_end_marker(ENB, 0).await,
        Err(TunnelError::NoDevice)
    );
    Ok(())
}

#[async_std::test]
async fn unrunnable_command_disables_end_markers() -> Result<()> {
    let gw = init().await?;
    gw.switch.set_unreachable(true);

    assert!(gw.gtp.send_end_marker(ENB, 1).await.is_err());
    assert_eq!(
        gw.gtp.end_marker_state(),
        EndMarkerState::PermanentlyDisabled
    );
    Ok(())
}
