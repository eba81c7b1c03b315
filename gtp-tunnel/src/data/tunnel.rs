use super::DualStackAddr;
use anyhow::ensure;
use derive_deref::Deref;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// IMSI, as a string of up to 15 decimal digits (TS23.003, 2.2).
#[derive(Debug, Clone, PartialEq, Eq, Deref)]
pub struct Imsi(String);

impl Imsi {
    pub fn as_u64(&self) -> u64 {
        self.0
            .bytes()
            .fold(0u64, |acc, digit| acc * 10 + u64::from(digit - b'0'))
    }
}

impl FromStr for Imsi {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ensure!(
            !s.is_empty() && s.len() <= 15,
            "IMSI must be between 1 and 15 digits"
        );
        ensure!(
            s.bytes().all(|c| c.is_ascii_digit()),
            "IMSI contained a non digit"
        );
        Ok(Imsi(s.to_string()))
    }
}

impl fmt::Display for Imsi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Downlink packet filter.  Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownlinkFlow {
    pub src_ip: Option<IpAddr>,
    pub dst_ip: Option<IpAddr>,
    pub ip_proto: Option<u8>,
    pub src_port: Option<u16>,
    pub dst_port: Option<u16>,
    pub tos: Option<u8>,
}

/// A GTP-U tunnel between the gateway and an eNB for one UE bearer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GtpTunnel {
    pub ue: DualStackAddr,
    pub enb: DualStackAddr,
    pub vlan: Option<u16>,
    pub i_tei: u32,
    pub o_tei: u32,
    pub imsi: Imsi,
    pub flow_dl: Option<DownlinkFlow>,
    pub flow_precedence_dl: u32,
    pub apn: Option<String>,
}

/// Identifies a GTP-U tunnel to delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelRef {
    pub ue: DualStackAddr,
    pub enb: DualStackAddr,
    pub i_tei: u32,
    pub flow_dl: Option<DownlinkFlow>,
}

/// A roaming (S8) tunnel, where UE traffic is relayed between an eNB and the
/// home network PGW.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S8Tunnel {
    pub ue: DualStackAddr,
    pub enb: DualStackAddr,
    pub pgw: DualStackAddr,
    pub vlan: Option<u16>,
    pub i_tei: u32,
    pub o_tei: u32,
    pub pgw_i_tei: u32,
    pub pgw_o_tei: u32,
    pub imsi: Imsi,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S8TunnelRef {
    pub ue: DualStackAddr,
    pub enb: DualStackAddr,
    pub pgw: DualStackAddr,
    pub i_tei: u32,
    pub pgw_i_tei: u32,
}

impl fmt::Display for GtpTunnel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(ue {} {:x}, enb {} {:x})",
            self.ue, self.i_tei, self.enb, self.o_tei
        )
    }
}

impl fmt::Display for S8Tunnel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(ue {} {:x}, enb {} {:x}, pgw {} {:x}/{:x})",
            self.ue, self.i_tei, self.enb, self.o_tei, self.pgw, self.pgw_i_tei, self.pgw_o_tei
        )
    }
}
