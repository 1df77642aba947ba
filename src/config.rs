//! Dialer configuration.

use crate::base::neterror::NetError;
use crate::dns::normalize::{parse_ip_literal, split_host_port};
use crate::socket::protect::Protect;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// Port used when the DNS server is given without one.
pub const DEFAULT_DNS_PORT: u16 = 53;

/// Immutable settings shared by every call on a [`Dialer`](crate::Dialer).
#[derive(Clone)]
pub struct DialerConfig {
    /// Callback run on every socket before it is used
    pub protect: Arc<dyn Protect>,
    /// DNS server as `ip`, `ip:port`, `[ipv6]:port`; port defaults to 53
    pub dns_server: String,
    /// Bound on each DNS exchange
    pub dns_timeout: Duration,
    /// Bound on the TCP handshake for `dial`; `None` waits for the OS
    pub connect_timeout: Option<Duration>,
    /// Retry truncated UDP answers over TCP
    pub dns_tcp_fallback: bool,
}

impl DialerConfig {
    /// Create a config with default timeouts.
    pub fn new(protect: impl Protect + 'static, dns_server: impl Into<String>) -> Self {
        Self::from_arc(Arc::new(protect), dns_server)
    }

    /// Create a config from an already shared protect callback.
    pub fn from_arc(protect: Arc<dyn Protect>, dns_server: impl Into<String>) -> Self {
        Self {
            protect,
            dns_server: dns_server.into(),
            dns_timeout: Duration::from_secs(5),
            connect_timeout: Some(Duration::from_secs(30)),
            dns_tcp_fallback: true,
        }
    }

    /// Set the DNS exchange timeout.
    pub fn dns_timeout(mut self, timeout: Duration) -> Self {
        self.dns_timeout = timeout;
        self
    }

    /// Set the connect timeout used by `dial`.
    pub fn connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Enable or disable the TCP retry for truncated DNS answers.
    pub fn dns_tcp_fallback(mut self, enabled: bool) -> Self {
        self.dns_tcp_fallback = enabled;
        self
    }

    /// Parses the configured DNS server into a socket address.
    ///
    /// The server must be an IP literal; resolving it by name would need
    /// the resolver it configures.
    pub fn dns_server_addr(&self) -> Result<SocketAddr, NetError> {
        let raw = self.dns_server.trim();
        let (host, port) = split_host_port(raw).unwrap_or((raw, DEFAULT_DNS_PORT));
        let ip = parse_ip_literal(host)
            .ok_or_else(|| NetError::address_invalid(raw, "dns server must be an IP literal"))?;
        Ok(SocketAddr::new(ip, port))
    }
}

impl fmt::Debug for DialerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialerConfig")
            .field("dns_server", &self.dns_server)
            .field("dns_timeout", &self.dns_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("dns_tcp_fallback", &self.dns_tcp_fallback)
            .finish_non_exhaustive()
    }
}
