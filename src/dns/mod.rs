//! DNS Resolution Module
//!
//! Resolves names against one explicitly configured DNS server instead of
//! the system resolver, so the lookup traffic can be protected like every
//! other socket the dialer opens:
//! - Address literal normalization (brackets, IPv6 zones)
//! - `host:port` splitting
//! - UDP queries with TCP fallback, over protected sockets
//!
//! # Architecture
//!
//! The `Resolve` trait is the core abstraction; [`ProtectedResolver`]
//! implements it so the protected path can be plugged into anything that
//! accepts a resolver.
//!
//! # Example
//!
//! ```rust,ignore
//! use protectnet::dns::{Name, Resolve};
//!
//! let resolver = dialer.resolver();
//! let addrs = resolver.resolve(Name::new("example.com")).await?;
//! for addr in addrs {
//!     println!("Resolved: {}", addr);
//! }
//! ```

mod exchange;
pub mod normalize;
mod resolve;
mod resolver;

pub use normalize::{normalize, normalize_str, parse_ip_literal, split_host_port};
pub use resolve::{Addrs, Name, Resolve, ResolvedAddress, Resolving};
pub use resolver::ProtectedResolver;
