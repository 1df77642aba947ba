//! Socket creation and connection handling.
//!
//! - [`protect`]: The protection capability supplied by the tunnel layer
//! - [`factory`]: allocate → protect → connect/bind
//! - [`client`]: The caller-owned [`Connection`](client::Connection)

pub mod client;
pub mod factory;
pub mod protect;

pub use client::{Connection, SocketType};
pub use factory::SocketFactory;
pub use protect::Protect;
