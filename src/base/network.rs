//! Network names accepted by the dialer.

use crate::base::neterror::NetError;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

/// Transport and address family requested by a caller, as in
/// `"tcp"`, `"tcp4"`, `"udp6"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    Tcp,
    Tcp4,
    Tcp6,
    Udp,
    Udp4,
    Udp6,
}

/// Address family constraint carried by a network name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Any,
    V4,
    V6,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Tcp => "tcp",
            Network::Tcp4 => "tcp4",
            Network::Tcp6 => "tcp6",
            Network::Udp => "udp",
            Network::Udp4 => "udp4",
            Network::Udp6 => "udp6",
        }
    }

    /// Stream (TCP) as opposed to datagram (UDP).
    pub fn is_stream(&self) -> bool {
        matches!(self, Network::Tcp | Network::Tcp4 | Network::Tcp6)
    }

    pub fn family(&self) -> Family {
        match self {
            Network::Tcp | Network::Udp => Family::Any,
            Network::Tcp4 | Network::Udp4 => Family::V4,
            Network::Tcp6 | Network::Udp6 => Family::V6,
        }
    }

    /// Whether `addr` may be used with this network.
    pub fn accepts(&self, addr: &SocketAddr) -> bool {
        match self.family() {
            Family::Any => true,
            Family::V4 => addr.is_ipv4(),
            Family::V6 => addr.is_ipv6(),
        }
    }

    /// The family-pinned datagram network for reaching `addr`.
    pub(crate) fn udp_for(addr: &SocketAddr) -> Network {
        if addr.is_ipv4() {
            Network::Udp4
        } else {
            Network::Udp6
        }
    }

    /// The family-pinned stream network for reaching `addr`.
    pub(crate) fn tcp_for(addr: &SocketAddr) -> Network {
        if addr.is_ipv4() {
            Network::Tcp4
        } else {
            Network::Tcp6
        }
    }
}

impl FromStr for Network {
    type Err = NetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tcp" => Ok(Network::Tcp),
            "tcp4" => Ok(Network::Tcp4),
            "tcp6" => Ok(Network::Tcp6),
            "udp" => Ok(Network::Udp),
            "udp4" => Ok(Network::Udp4),
            "udp6" => Ok(Network::Udp6),
            other => Err(NetError::UnknownNetwork(other.to_string())),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
