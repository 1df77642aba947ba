use std::io;
use std::net::SocketAddr;
use std::os::fd::RawFd;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum NetError {
    // Address Errors
    #[error("Invalid address {addr:?}: {reason}")]
    AddressInvalid { addr: String, reason: &'static str },
    #[error("Unknown network {0:?}")]
    UnknownNetwork(String),

    // Resolution Errors
    #[error("Name not resolved for {query}: {source}")]
    NameNotResolved {
        query: String,
        #[source]
        source: Arc<io::Error>,
    },

    // Socket Errors
    #[error("Protect callback failed for fd {fd}: {source}")]
    ProtectionFailed {
        fd: RawFd,
        #[source]
        source: Arc<io::Error>,
    },
    #[error("Unable to create {network} socket: {source}")]
    SocketCreationFailed {
        network: String,
        #[source]
        source: Arc<io::Error>,
    },
    #[error("Connection to {addr} failed: {source}")]
    ConnectionFailed {
        addr: SocketAddr,
        #[source]
        source: Arc<io::Error>,
    },
}

impl NetError {
    pub(crate) fn address_invalid(addr: &str, reason: &'static str) -> Self {
        NetError::AddressInvalid {
            addr: addr.to_string(),
            reason,
        }
    }

    pub(crate) fn dns_failed(query: &str, source: io::Error) -> Self {
        NetError::NameNotResolved {
            query: query.to_string(),
            source: Arc::new(source),
        }
    }

    pub(crate) fn protection_failed(fd: RawFd, source: io::Error) -> Self {
        NetError::ProtectionFailed {
            fd,
            source: Arc::new(source),
        }
    }

    pub(crate) fn socket_failed(network: &str, source: io::Error) -> Self {
        NetError::SocketCreationFailed {
            network: network.to_string(),
            source: Arc::new(source),
        }
    }

    pub(crate) fn connection_failed_to(addr: SocketAddr, source: io::Error) -> Self {
        NetError::ConnectionFailed {
            addr,
            source: Arc::new(source),
        }
    }

    /// True when the failure was a deadline expiring (DNS or connect).
    pub fn is_timeout(&self) -> bool {
        match self {
            NetError::NameNotResolved { source, .. }
            | NetError::ConnectionFailed { source, .. } => {
                source.kind() == io::ErrorKind::TimedOut
            }
            _ => false,
        }
    }

    /// Chromium-style error code, matching `net_error_list.h` where a
    /// counterpart exists.
    pub fn as_i32(&self) -> i32 {
        match self {
            NetError::AddressInvalid { .. } => -108,
            NetError::UnknownNetwork(_) => -108,
            NetError::NameNotResolved { .. } => -105,
            NetError::ProtectionFailed { .. } => -138,
            NetError::SocketCreationFailed { .. } => -104,
            NetError::ConnectionFailed { source, .. } => match source.kind() {
                io::ErrorKind::TimedOut => -118,
                io::ErrorKind::ConnectionRefused => -102,
                io::ErrorKind::ConnectionReset => -101,
                io::ErrorKind::ConnectionAborted => -103,
                _ => -104,
            },
        }
    }
}
