use derive_deref::Deref;
use std::fmt::{self, Write};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Longest port name we generate.  "g_" plus 32 hex digits of an IPv6 address
/// fits with room to spare.
pub const MAX_PORT_NAME_LEN: usize = 38;

/// Name of the OVS GTP port that carries traffic to and from one peer.
#[derive(Debug, Clone, PartialEq, Eq, Deref)]
pub struct PortName(heapless::String<MAX_PORT_NAME_LEN>);

impl PortName {
    pub fn from_ip(ip: IpAddr) -> Self {
        match ip {
            IpAddr::V4(x) => Self::from_ipv4(x),
            IpAddr::V6(x) => Self::from_ipv6(x),
        }
    }

    /// The address word is taken as it sits in memory on a little-endian
    /// gateway, so 10.0.0.1 is named g_100000a.
    pub fn from_ipv4(ip: Ipv4Addr) -> Self {
        Self::format(format_args!("g_{:x}", u32::from_le_bytes(ip.octets())))
    }

    pub fn from_ipv6(ip: Ipv6Addr) -> Self {
        Self::format(format_args!("g_{}", hex::encode(ip.octets())))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    fn format(args: fmt::Arguments) -> Self {
        let mut name = heapless::String::new();
        assert!(
            name.write_fmt(args).is_ok(),
            "GTP port name {args} longer than {MAX_PORT_NAME_LEN} characters"
        );
        PortName(name)
    }
}

impl fmt::Display for PortName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
