//! Protected dialer facade.
//!
//! Combines the protected resolver and socket factory behind the
//! `network` + `"host:port"` interface familiar from other dialers.
//!
//! # Example
//!
//! ```rust,ignore
//! use protectnet::Dialer;
//! use std::os::fd::RawFd;
//! use tokio::io::AsyncWriteExt;
//!
//! let dialer = Dialer::new(|fd: RawFd| vpn.protect(fd), "8.8.8.8");
//!
//! // Resolve once, dial many times.
//! let resolved = dialer.resolve_tcp("tcp", "example.com:80").await?;
//! let mut conn = dialer.dial("tcp", &resolved.to_string()).await?;
//! conn.write_all(b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n").await?;
//! ```

use crate::base::dialstate::DialState;
use crate::base::network::Network;
use crate::base::neterror::NetError;
use crate::config::DialerConfig;
use crate::dns::{ProtectedResolver, ResolvedAddress};
use crate::socket::client::Connection;
use crate::socket::factory::SocketFactory;
use crate::socket::protect::Protect;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Dials outbound TCP/UDP connections whose sockets are protected before
/// use, resolving names through the configured DNS server.
///
/// Cloning is cheap and every clone shares the same immutable
/// configuration; calls from many tasks at once are fine. Separate
/// `Dialer`s with different DNS servers or callbacks are independent.
#[derive(Clone, Debug)]
pub struct Dialer {
    config: Arc<DialerConfig>,
    resolver: ProtectedResolver,
    factory: SocketFactory,
}

impl Dialer {
    /// Create a dialer with default timeouts.
    ///
    /// `dns_server` is an IP literal with an optional port (default 53).
    /// It is validated on first resolution.
    pub fn new(protect: impl Protect + 'static, dns_server: impl Into<String>) -> Self {
        Self::with_config(DialerConfig::new(protect, dns_server))
    }

    /// Create a dialer from a full configuration.
    pub fn with_config(config: DialerConfig) -> Self {
        let config = Arc::new(config);
        Self {
            resolver: ProtectedResolver::new(config.clone()),
            factory: SocketFactory::new(config.protect.clone()),
            config,
        }
    }

    pub fn config(&self) -> &DialerConfig {
        &self.config
    }

    /// The protected resolver, usable wherever a [`Resolve`](crate::dns::Resolve)
    /// is accepted.
    pub fn resolver(&self) -> &ProtectedResolver {
        &self.resolver
    }

    /// Resolves `addr` for a stream network (`tcp`, `tcp4`, `tcp6`).
    ///
    /// Literal hosts are normalized and returned without a lookup.
    pub async fn resolve_tcp(
        &self,
        network: &str,
        addr: &str,
    ) -> Result<ResolvedAddress, NetError> {
        let network = parse_network(network, true)?;
        self.resolver.resolve_addr(network, addr).await
    }

    /// Resolves `addr` for a datagram network (`udp`, `udp4`, `udp6`).
    pub async fn resolve_udp(
        &self,
        network: &str,
        addr: &str,
    ) -> Result<ResolvedAddress, NetError> {
        let network = parse_network(network, false)?;
        self.resolver.resolve_addr(network, addr).await
    }

    /// Resolves `addr` if needed and returns a protected connection.
    ///
    /// TCP connects are bounded by the configured `connect_timeout`.
    pub async fn dial(&self, network: &str, addr: &str) -> Result<Connection, NetError> {
        let deadline = self.config.connect_timeout.map(|t| Instant::now() + t);
        self.dial_inner(network, addr, deadline).await
    }

    /// Like [`dial`](Self::dial), with resolution and connect together
    /// bounded by `timeout`.
    pub async fn dial_timeout(
        &self,
        network: &str,
        addr: &str,
        timeout: Duration,
    ) -> Result<Connection, NetError> {
        self.dial_inner(network, addr, Some(Instant::now() + timeout)).await
    }

    /// Like [`dial`](Self::dial), giving up at `deadline`.
    pub async fn dial_deadline(
        &self,
        network: &str,
        addr: &str,
        deadline: Instant,
    ) -> Result<Connection, NetError> {
        self.dial_inner(network, addr, Some(deadline)).await
    }

    /// Dials an address resolved earlier, skipping DNS entirely.
    pub async fn dial_resolved(
        &self,
        network: &str,
        resolved: &ResolvedAddress,
    ) -> Result<Connection, NetError> {
        let network: Network = network.parse()?;
        let deadline = self.config.connect_timeout.map(|t| Instant::now() + t);
        self.open(network, *resolved, deadline).await
    }

    /// Dials UDP with the local side bound to `local`.
    pub async fn dial_udp(
        &self,
        network: &str,
        local: Option<SocketAddr>,
        addr: &str,
    ) -> Result<Connection, NetError> {
        let network = parse_network(network, false)?;
        let resolved = self.resolver.resolve_addr(network, addr).await?;
        let conn = self.factory.bind_udp(network, local, resolved)?;
        tracing::trace!(%network, %resolved, state = ?DialState::Open, "dial complete");
        Ok(conn)
    }

    async fn dial_inner(
        &self,
        network: &str,
        addr: &str,
        deadline: Option<Instant>,
    ) -> Result<Connection, NetError> {
        let network: Network = network.parse()?;
        let resolving = self.resolver.resolve_addr(network, addr);
        let resolved = match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, resolving)
                .await
                .unwrap_or_else(|_| {
                    Err(NetError::dns_failed(
                        addr,
                        io::Error::new(io::ErrorKind::TimedOut, "dial deadline exceeded"),
                    ))
                })?,
            None => resolving.await?,
        };
        self.open(network, resolved, deadline).await
    }

    async fn open(
        &self,
        network: Network,
        resolved: ResolvedAddress,
        deadline: Option<Instant>,
    ) -> Result<Connection, NetError> {
        let conn = self.factory.create_protected(network, resolved, deadline).await?;
        tracing::trace!(%network, %resolved, state = ?DialState::Open, "dial complete");
        Ok(conn)
    }
}

fn parse_network(network: &str, stream: bool) -> Result<Network, NetError> {
    let parsed: Network = network.parse()?;
    if parsed.is_stream() != stream {
        return Err(NetError::UnknownNetwork(network.to_string()));
    }
    Ok(parsed)
}
