use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// The address of a tunnel endpoint (UE, eNB or PGW), which may have an IPv4
/// address, an IPv6 address, or both.  Unspecified addresses (0.0.0.0 and ::)
/// are treated as absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DualStackAddr {
    ipv4: Option<Ipv4Addr>,
    ipv6: Option<Ipv6Addr>,
}

impl DualStackAddr {
    pub fn new(ipv4: Option<Ipv4Addr>, ipv6: Option<Ipv6Addr>) -> Self {
        DualStackAddr {
            ipv4: ipv4.filter(|a| !a.is_unspecified()),
            ipv6: ipv6.filter(|a| !a.is_unspecified()),
        }
    }

    pub fn v4(ipv4: Ipv4Addr) -> Self {
        Self::new(Some(ipv4), None)
    }

    pub fn v6(ipv6: Ipv6Addr) -> Self {
        Self::new(None, Some(ipv6))
    }

    pub fn ipv4(&self) -> Option<Ipv4Addr> {
        self.ipv4
    }

    pub fn ipv6(&self) -> Option<Ipv6Addr> {
        self.ipv6
    }

    pub fn is_unspecified(&self) -> bool {
        self.ipv4.is_none() && self.ipv6.is_none()
    }

    /// The address used to reach this endpoint: IPv4 if there is one, otherwise IPv6.
    pub fn preferred(&self) -> Option<IpAddr> {
        self.ipv4
            .map(IpAddr::V4)
            .or_else(|| self.ipv6.map(IpAddr::V6))
    }
}

impl From<Ipv4Addr> for DualStackAddr {
    fn from(ipv4: Ipv4Addr) -> Self {
        Self::v4(ipv4)
    }
}

impl From<Ipv6Addr> for DualStackAddr {
    fn from(ipv6: Ipv6Addr) -> Self {
        Self::v6(ipv6)
    }
}

impl From<IpAddr> for DualStackAddr {
    fn from(ip: IpAddr) -> Self {
        match ip {
            IpAddr::V4(x) => Self::v4(x),
            IpAddr::V6(x) => Self::v6(x),
        }
    }
}

impl fmt::Display for DualStackAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.ipv4, self.ipv6) {
            (Some(v4), Some(v6)) => write!(f, "{v4}/{v6}"),
            (Some(v4), None) => write!(f, "{v4}"),
            (None, Some(v6)) => write!(f, "{v6}"),
            (None, None) => write!(f, "unspecified"),
        }
    }
}
