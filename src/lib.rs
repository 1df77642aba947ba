//! # protectnet
//!
//! A network dialer for processes that run behind their own VPN tunnel.
//!
//! Every socket `protectnet` opens (application connections and the DNS
//! queries that precede them) is handed to a caller-supplied protect
//! callback before it is connected, so the platform can exempt it from the
//! tunnel. Names are resolved against an explicitly configured DNS server,
//! never the system resolver.
//!
//! ## Features
//!
//! - **Protect before use**: the callback sees each descriptor exactly once, before connect
//! - **Protected DNS**: UDP queries with TCP fallback, sent over protected sockets
//! - **Address normalization**: IPv6 brackets and zone identifiers are stripped
//! - **TCP and UDP**: `tcp`, `tcp4`, `tcp6`, `udp`, `udp4`, `udp6`
//! - **hyper transport**: [`Connection`] implements hyper's `rt::Read`/`rt::Write`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use protectnet::Dialer;
//! use std::os::fd::RawFd;
//!
//! #[tokio::main]
//! async fn main() {
//!     let dialer = Dialer::new(|fd: RawFd| -> std::io::Result<()> { vpn_protect(fd) }, "8.8.8.8");
//!     let conn = dialer.dial("tcp", "example.com:80").await.unwrap();
//!     println!("Connected to {}", conn.peer_addr());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error kinds, network names and dial states
//! - [`config`] - Dialer settings
//! - [`dialer`] - The [`Dialer`] facade
//! - [`dns`] - Address normalization and protected resolution
//! - [`socket`] - Protected socket creation and [`Connection`]

#[cfg(not(unix))]
compile_error!("protectnet requires a platform with Unix file descriptors");

pub mod base;
pub mod config;
pub mod dialer;
pub mod dns;
pub mod socket;

pub use base::{DialState, NetError, Network};
pub use config::DialerConfig;
pub use dialer::Dialer;
pub use dns::{normalize, ResolvedAddress};
pub use socket::{Connection, Protect};
