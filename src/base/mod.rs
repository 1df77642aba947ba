//! Base types and error handling.
//!
//! Provides foundational types shared by the resolver and socket layers:
//! - [`NetError`]: Error kinds for address parsing, resolution, protection and connect
//! - [`DialState`]: Per-attempt dial lifecycle
//! - [`Network`]: The `tcp`/`udp` network names accepted by the dialer

pub mod context;
pub mod dialstate;
pub mod network;
pub mod neterror;

pub use dialstate::DialState;
pub use network::Network;
pub use neterror::NetError;
