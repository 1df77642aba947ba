//! Protected socket creation.
//!
//! Every socket goes through the same sequence:
//! allocate → protect → connect (stream) or bind + set peer (datagram).
//! The descriptor reaches the protect callback before the kernel has seen
//! any address for it, and a socket whose protection failed is dropped
//! (closed) without ever being connected.

use crate::base::context::IoResultExt;
use crate::base::dialstate::DialState;
use crate::base::network::Network;
use crate::base::neterror::NetError;
use crate::dns::ResolvedAddress;
use crate::socket::client::{Connection, SocketType};
use crate::socket::protect::Protect;
use socket2::{Domain, Protocol, Socket, Type};
use std::fmt;
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::os::fd::AsRawFd;
use std::sync::Arc;
use tokio::net::{TcpSocket, UdpSocket};
use tokio::time::Instant;

/// Creates sockets and hands each descriptor to the protect callback
/// before use.
#[derive(Clone)]
pub struct SocketFactory {
    protect: Arc<dyn Protect>,
}

impl SocketFactory {
    pub fn new(protect: Arc<dyn Protect>) -> Self {
        Self { protect }
    }

    /// Creates a protected socket connected to `resolved`.
    ///
    /// Stream networks perform the TCP handshake, bounded by `deadline`.
    /// Datagram networks bind an ephemeral port and set `resolved` as the
    /// default peer. On every error path the socket is closed before
    /// returning.
    pub async fn create_protected(
        &self,
        network: Network,
        resolved: ResolvedAddress,
        deadline: Option<Instant>,
    ) -> Result<Connection, NetError> {
        let addr = resolved.socket_addr();
        if network.is_stream() {
            self.connect_tcp(network, addr, deadline).await
        } else {
            self.connect_udp(network, None, addr)
        }
    }

    /// Creates a protected UDP socket bound to `local` with `remote` as its
    /// default peer. `None` binds the unspecified address of the peer's
    /// family on an ephemeral port.
    ///
    /// Must be called from within a tokio runtime.
    pub fn bind_udp(
        &self,
        network: Network,
        local: Option<SocketAddr>,
        remote: ResolvedAddress,
    ) -> Result<Connection, NetError> {
        if network.is_stream() {
            return Err(NetError::UnknownNetwork(network.to_string()));
        }
        self.connect_udp(network, local, remote.socket_addr())
    }

    /// Allocates a socket and runs the protect callback on it.
    fn protected_socket(
        &self,
        network: Network,
        addr: SocketAddr,
        ty: Type,
        protocol: Protocol,
    ) -> Result<Socket, NetError> {
        if !network.accepts(&addr) {
            return Err(NetError::address_invalid(
                &addr.to_string(),
                "address family does not match network",
            ));
        }

        let socket = Socket::new(Domain::for_address(addr), ty, Some(protocol))
            .socket_context(network.as_str())?;
        let fd = socket.as_raw_fd();
        tracing::trace!(fd, %network, state = ?DialState::Created, "socket created");

        if let Err(e) = self.protect.protect(fd) {
            tracing::warn!(
                fd,
                %network,
                %addr,
                error = %e,
                state = ?DialState::Failed,
                "protect callback failed"
            );
            drop(socket);
            return Err(NetError::protection_failed(fd, e));
        }
        tracing::trace!(fd, state = ?DialState::Protected, "socket protected");

        socket.set_nonblocking(true).socket_context(network.as_str())?;
        Ok(socket)
    }

    async fn connect_tcp(
        &self,
        network: Network,
        addr: SocketAddr,
        deadline: Option<Instant>,
    ) -> Result<Connection, NetError> {
        let socket = self.protected_socket(network, addr, Type::STREAM, Protocol::TCP)?;
        let fd = socket.as_raw_fd();
        let tcp = TcpSocket::from_std_stream(socket.into());

        // Dropping the connect future on timeout drops the socket with it.
        let connect = tcp.connect(addr);
        let stream = match deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, connect).await {
                Ok(result) => result,
                Err(_) => Err(io::Error::new(io::ErrorKind::TimedOut, "connect timed out")),
            },
            None => connect.await,
        }
        .inspect_err(|e| {
            tracing::debug!(fd, %addr, error = %e, state = ?DialState::Failed, "connect failed");
        })
        .connect_context(addr)?;

        tracing::debug!(fd, %network, %addr, state = ?DialState::Connected, "tcp connected");
        Ok(Connection::new(SocketType::Tcp(stream), network, addr))
    }

    fn connect_udp(
        &self,
        network: Network,
        local: Option<SocketAddr>,
        addr: SocketAddr,
    ) -> Result<Connection, NetError> {
        let socket = self.protected_socket(network, addr, Type::DGRAM, Protocol::UDP)?;
        let fd = socket.as_raw_fd();

        // Bind failures report the local address, like connect failures.
        let local = local.unwrap_or_else(|| unspecified_for(&addr));
        socket.bind(&local.into()).connect_context(local)?;
        socket.connect(&addr.into()).connect_context(addr)?;

        let udp = UdpSocket::from_std(socket.into()).socket_context(network.as_str())?;
        tracing::debug!(fd, %network, %addr, state = ?DialState::Connected, "udp peer set");
        Ok(Connection::new(SocketType::Udp(udp), network, addr))
    }
}

fn unspecified_for(addr: &SocketAddr) -> SocketAddr {
    let ip = match addr {
        SocketAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        SocketAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
    };
    SocketAddr::new(ip, 0)
}

impl fmt::Debug for SocketFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SocketFactory").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::fd::RawFd;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn recording_factory() -> (SocketFactory, Arc<Mutex<Vec<RawFd>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let factory = SocketFactory::new(Arc::new(move |fd: RawFd| -> io::Result<()> {
            seen_clone.lock().unwrap().push(fd);
            Ok(())
        }));
        (factory, seen)
    }

    #[tokio::test]
    async fn test_tcp_connect_protects_once() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (factory, seen) = recording_factory();

        let conn = factory
            .create_protected(Network::Tcp, addr.into(), None)
            .await
            .unwrap();
        let (_accepted, _) = listener.accept().await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_ne!(seen[0], 0);
        assert_eq!(seen[0], conn.as_raw_fd());
        assert_eq!(conn.peer_addr(), addr);
    }

    #[tokio::test]
    async fn test_udp_sets_default_peer() {
        let peer = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        let addr = peer.local_addr().unwrap();
        let (factory, seen) = recording_factory();

        let conn = factory
            .create_protected(Network::Udp4, addr.into(), None)
            .await
            .unwrap();

        assert_eq!(seen.lock().unwrap().len(), 1);
        assert!(matches!(conn.inner(), SocketType::Udp(_)));
        assert_ne!(conn.local_addr().unwrap().port(), 0);
        assert_eq!(conn.peer_addr(), addr);
    }

    #[tokio::test]
    async fn test_family_mismatch_never_creates_socket() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let factory = SocketFactory::new(Arc::new(move |_fd: RawFd| -> io::Result<()> {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));

        let v6: SocketAddr = "[::1]:80".parse().unwrap();
        let err = factory
            .create_protected(Network::Tcp4, v6.into(), None)
            .await
            .unwrap_err();

        assert!(matches!(err, NetError::AddressInvalid { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_bind_udp_rejects_stream_network() {
        let (factory, seen) = recording_factory();
        let remote: SocketAddr = "127.0.0.1:53".parse().unwrap();
        let err = factory.bind_udp(Network::Tcp, None, remote.into()).unwrap_err();
        assert!(matches!(err, NetError::UnknownNetwork(_)));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bind_udp_local_in_use() {
        let taken = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        let local = taken.local_addr().unwrap();
        let remote: SocketAddr = "127.0.0.1:53".parse().unwrap();
        let (factory, seen) = recording_factory();

        let err = factory
            .bind_udp(Network::Udp4, Some(local), remote.into())
            .unwrap_err();

        match &err {
            NetError::ConnectionFailed { addr, source } => {
                assert_eq!(*addr, local);
                assert_eq!(source.kind(), io::ErrorKind::AddrInUse);
            }
            other => panic!("expected ConnectionFailed, got {other:?}"),
        }
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_unspecified_for_family() {
        let v4: SocketAddr = "10.0.0.1:53".parse().unwrap();
        let v6: SocketAddr = "[2001:db8::1]:53".parse().unwrap();
        assert_eq!(unspecified_for(&v4), "0.0.0.0:0".parse::<SocketAddr>().unwrap());
        assert_eq!(unspecified_for(&v6), "[::]:0".parse::<SocketAddr>().unwrap());
    }
}
