//! Resolution against the configured DNS server.
//!
//! Literal hosts never touch the network. Everything else becomes one or
//! two questions to `DialerConfig::dns_server`, asked over sockets from the
//! protected [`SocketFactory`]. There is no cache: each call resolves fresh.
//!
//! # Answer selection
//!
//! Family-pinned networks (`tcp4`, `udp6`, ...) ask only for `A` or only
//! for `AAAA`. Unpinned networks ask for `A` first and fall back to `AAAA`
//! when the name has no IPv4 address. The first record in server order
//! wins, so the same answer always yields the same address.

use super::exchange::DnsExchange;
use super::normalize::{parse_ip_literal, split_host_port};
use super::{Addrs, Name, Resolve, ResolvedAddress, Resolving};
use crate::base::network::{Family, Network};
use crate::base::neterror::NetError;
use crate::config::DialerConfig;
use crate::socket::factory::SocketFactory;
use hickory_proto::rr::RecordType;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

/// Resolver bound to one dialer's DNS server and protect callback.
#[derive(Clone, Debug)]
pub struct ProtectedResolver {
    config: Arc<DialerConfig>,
    factory: SocketFactory,
}

impl ProtectedResolver {
    pub fn new(config: Arc<DialerConfig>) -> Self {
        let factory = SocketFactory::new(config.protect.clone());
        Self { config, factory }
    }

    /// Resolves `host:port` to one address usable with `network`.
    pub async fn resolve_addr(
        &self,
        network: Network,
        addr: &str,
    ) -> Result<ResolvedAddress, NetError> {
        let (host, port) = split_host_port(addr)?;

        if let Some(ip) = parse_ip_literal(host) {
            let resolved = ResolvedAddress::new(ip, port);
            if !network.accepts(&resolved.socket_addr()) {
                return Err(NetError::address_invalid(
                    addr,
                    "address family does not match network",
                ));
            }
            return Ok(resolved);
        }

        let ips = self.lookup_ip(host, network.family(), addr).await?;
        let ip = ips.into_iter().next().ok_or_else(|| no_addresses(addr))?;
        tracing::debug!(%network, addr, %ip, "resolved");
        Ok(ResolvedAddress::new(ip, port))
    }

    /// Looks `host` up for `family`, returning addresses in server order.
    ///
    /// `query` labels errors; it is normally the caller's original
    /// `host:port` string.
    pub async fn lookup_ip(
        &self,
        host: &str,
        family: Family,
        query: &str,
    ) -> Result<Vec<IpAddr>, NetError> {
        if let Some(ip) = parse_ip_literal(host) {
            return Ok(vec![ip]);
        }

        let exchange = self.exchange()?;
        for record_type in record_types(family) {
            let ips = exchange.lookup(host, *record_type, query).await?;
            if !ips.is_empty() {
                return Ok(ips);
            }
        }
        Err(no_addresses(query))
    }

    /// Looks up both `A` and `AAAA` records, IPv4 first.
    pub async fn lookup_all(&self, host: &str) -> Result<Vec<IpAddr>, NetError> {
        if let Some(ip) = parse_ip_literal(host) {
            return Ok(vec![ip]);
        }

        let exchange = self.exchange()?;
        let mut ips = exchange.lookup(host, RecordType::A, host).await?;
        match exchange.lookup(host, RecordType::AAAA, host).await {
            Ok(v6) => ips.extend(v6),
            // An IPv4 answer is enough; a failing AAAA query only matters
            // when nothing else came back.
            Err(e) if ips.is_empty() => return Err(e),
            Err(e) => tracing::debug!(host, error = %e, "AAAA lookup failed"),
        }

        if ips.is_empty() {
            return Err(no_addresses(host));
        }
        Ok(ips)
    }

    fn exchange(&self) -> Result<DnsExchange<'_>, NetError> {
        let server = self.config.dns_server_addr()?;
        Ok(DnsExchange::new(
            &self.factory,
            server,
            self.config.dns_timeout,
            self.config.dns_tcp_fallback,
        ))
    }
}

fn record_types(family: Family) -> &'static [RecordType] {
    match family {
        Family::Any => &[RecordType::A, RecordType::AAAA],
        Family::V4 => &[RecordType::A],
        Family::V6 => &[RecordType::AAAA],
    }
}

fn no_addresses(query: &str) -> NetError {
    NetError::dns_failed(
        query,
        io::Error::new(io::ErrorKind::NotFound, "no usable addresses in dns answer"),
    )
}

impl Resolve for ProtectedResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let resolver = self.clone();
        Box::pin(async move {
            let ips = resolver.lookup_all(name.as_str()).await?;
            let addrs: Vec<SocketAddr> = ips.into_iter().map(|ip| SocketAddr::new(ip, 0)).collect();
            Ok(Box::new(addrs.into_iter()) as Addrs)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::fd::RawFd;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_resolver(dns_server: &str) -> (ProtectedResolver, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let config = DialerConfig::new(
            move |_fd: RawFd| -> io::Result<()> {
                calls_clone.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
            dns_server,
        );
        (ProtectedResolver::new(Arc::new(config)), calls)
    }

    #[test]
    fn test_record_types_by_family() {
        assert_eq!(record_types(Family::Any), &[RecordType::A, RecordType::AAAA]);
        assert_eq!(record_types(Family::V4), &[RecordType::A]);
        assert_eq!(record_types(Family::V6), &[RecordType::AAAA]);
    }

    #[tokio::test]
    async fn test_literal_skips_network() {
        // The DNS server is unusable; literals must not need it.
        let (resolver, calls) = counting_resolver("not-an-ip");

        let resolved = resolver.resolve_addr(Network::Tcp, "[fe80::1%eth0]:443").await.unwrap();
        assert_eq!(resolved.to_string(), "[fe80::1]:443");

        let resolved = resolver.resolve_addr(Network::Udp4, "10.1.2.3:53").await.unwrap();
        assert_eq!(resolved.to_string(), "10.1.2.3:53");

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_literal_family_mismatch() {
        let (resolver, _) = counting_resolver("8.8.8.8");
        let err = resolver.resolve_addr(Network::Tcp6, "10.1.2.3:80").await.unwrap_err();
        assert!(matches!(err, NetError::AddressInvalid { .. }));
    }

    #[tokio::test]
    async fn test_malformed_address() {
        let (resolver, calls) = counting_resolver("8.8.8.8");
        let err = resolver.resolve_addr(Network::Tcp, "example.com").await.unwrap_err();
        assert!(matches!(err, NetError::AddressInvalid { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_dns_server_reported() {
        let (resolver, calls) = counting_resolver("dns.google");
        let err = resolver.resolve_addr(Network::Tcp, "example.com:80").await.unwrap_err();
        assert!(matches!(err, NetError::AddressInvalid { ref addr, .. } if addr == "dns.google"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
