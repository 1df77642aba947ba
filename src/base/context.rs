//! Ergonomic error context helpers.
//!
//! Provides extension traits for adding context to `Result` types,
//! converting IO errors into context-rich `NetError` variants.

use crate::base::neterror::NetError;
use std::io;
use std::net::SocketAddr;

/// Extension trait for adding context to IO Results.
pub trait IoResultExt<T> {
    /// Add connection context to an IO error.
    ///
    /// # Example
    /// ```ignore
    /// use protectnet::base::context::IoResultExt;
    ///
    /// let stream = socket.connect(addr).await.connect_context(addr)?;
    /// // Error: "Connection to 93.184.216.34:80 failed: connection refused"
    /// ```
    fn connect_context(self, addr: SocketAddr) -> Result<T, NetError>;

    /// Add DNS resolution context to an IO error.
    fn dns_context(self, query: &str) -> Result<T, NetError>;

    /// Add socket creation context to an IO error.
    fn socket_context(self, network: &str) -> Result<T, NetError>;
}

impl<T> IoResultExt<T> for Result<T, io::Error> {
    fn connect_context(self, addr: SocketAddr) -> Result<T, NetError> {
        self.map_err(|e| NetError::connection_failed_to(addr, e))
    }

    fn dns_context(self, query: &str) -> Result<T, NetError> {
        self.map_err(|e| NetError::dns_failed(query, e))
    }

    fn socket_context(self, network: &str) -> Result<T, NetError> {
        self.map_err(|e| NetError::socket_failed(network, e))
    }
}
