use crate::base::dialstate::DialState;
use crate::base::network::Network;
use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, RawFd};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::net::{TcpStream, UdpSocket};

/// The socket behind a [`Connection`].
#[derive(Debug)]
pub enum SocketType {
    Tcp(TcpStream),
    /// A UDP socket whose default peer is already set.
    Udp(UdpSocket),
}

impl SocketType {
    fn raw_fd(&self) -> RawFd {
        match self {
            SocketType::Tcp(s) => s.as_raw_fd(),
            SocketType::Udp(s) => s.as_raw_fd(),
        }
    }
}

/// A protected, connected socket owned by the caller.
///
/// Reads and writes go straight to the descriptor: a stream for TCP, one
/// datagram per call for UDP. The descriptor is closed by [`close`] or on
/// drop. `Connection` implements tokio's `AsyncRead`/`AsyncWrite` and
/// hyper's `rt::Read`/`rt::Write`, so it can be handed to a hyper client
/// handshake as its transport.
///
/// [`close`]: Connection::close
pub struct Connection {
    inner: SocketType,
    network: Network,
    peer: SocketAddr,
}

impl Connection {
    pub(crate) fn new(inner: SocketType, network: Network, peer: SocketAddr) -> Self {
        Self {
            inner,
            network,
            peer,
        }
    }

    /// The network this connection was dialed with.
    pub fn network(&self) -> Network {
        self.network
    }

    /// The remote address the socket was connected to.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        match &self.inner {
            SocketType::Tcp(s) => s.local_addr(),
            SocketType::Udp(s) => s.local_addr(),
        }
    }

    /// Get a reference to the inner socket.
    pub fn inner(&self) -> &SocketType {
        &self.inner
    }

    /// Consume and return the inner socket.
    pub fn into_inner(self) -> SocketType {
        self.inner
    }

    /// Shuts the socket down and releases the descriptor.
    ///
    /// A TCP peer that already went away is not an error here.
    pub async fn close(self) -> io::Result<()> {
        let fd = self.inner.raw_fd();
        let result = match self.inner {
            SocketType::Tcp(mut s) => match s.shutdown().await {
                Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
                other => other,
            },
            SocketType::Udp(_) => Ok(()),
        };
        tracing::trace!(fd, state = ?DialState::Closed, "connection closed");
        result
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("network", &self.network)
            .field("peer", &self.peer)
            .field("fd", &self.inner.raw_fd())
            .finish()
    }
}

impl AsRawFd for Connection {
    fn as_raw_fd(&self) -> RawFd {
        self.inner.raw_fd()
    }
}

impl AsFd for Connection {
    fn as_fd(&self) -> BorrowedFd<'_> {
        match &self.inner {
            SocketType::Tcp(s) => s.as_fd(),
            SocketType::Udp(s) => s.as_fd(),
        }
    }
}

impl AsyncRead for Connection {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match &mut self.get_mut().inner {
            SocketType::Tcp(s) => Pin::new(s).poll_read(cx, buf),
            SocketType::Udp(s) => s.poll_recv(cx, buf),
        }
    }
}

impl AsyncWrite for Connection {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match &mut self.get_mut().inner {
            SocketType::Tcp(s) => Pin::new(s).poll_write(cx, buf),
            SocketType::Udp(s) => s.poll_send(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut self.get_mut().inner {
            SocketType::Tcp(s) => Pin::new(s).poll_flush(cx),
            SocketType::Udp(_) => Poll::Ready(Ok(())),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut self.get_mut().inner {
            SocketType::Tcp(s) => Pin::new(s).poll_shutdown(cx),
            SocketType::Udp(_) => Poll::Ready(Ok(())),
        }
    }
}

// Implement hyper::rt::Read and hyper::rt::Write for Connection
// so it can be passed straight to hyper's client handshakes
impl hyper::rt::Read for Connection {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        mut buf: hyper::rt::ReadBufCursor<'_>,
    ) -> Poll<io::Result<()>> {
        // SAFETY: ReadBuf only writes initialized bytes into the cursor, and
        // we advance by exactly the number of bytes it reports as filled.
        let unfilled = unsafe { buf.as_mut() };
        let mut read_buf = ReadBuf::uninit(unfilled);
        match AsyncRead::poll_read(self.as_mut(), cx, &mut read_buf) {
            Poll::Ready(Ok(())) => {
                let n = read_buf.filled().len();
                unsafe { buf.advance(n) };
                Poll::Ready(Ok(()))
            }
            Poll::Ready(Err(e)) => Poll::Ready(Err(e)),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl hyper::rt::Write for Connection {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        <Self as AsyncWrite>::poll_write(self, cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        <Self as AsyncWrite>::poll_flush(self, cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        <Self as AsyncWrite>::poll_shutdown(self, cx)
    }
}
