//! Address literal normalization.
//!
//! IPv6 literals may arrive bracketed (`[::1]`) or carrying a zone
//! identifier (`fe80::1%wlan0`). Zones name a local interface and mean
//! nothing off-host, so every address leaving this module has them removed.

use crate::base::neterror::NetError;
use std::net::IpAddr;

/// Strips brackets and any `%zone` suffix from an address literal.
///
/// Best effort and non-validating: anything that is not an address passes
/// through with only the bracket and zone rules applied. The result is a
/// fixed point, so normalizing twice is the same as normalizing once.
///
/// ```
/// use protectnet::dns::normalize;
///
/// assert_eq!(normalize("[2001:4860:4860::8888%wlan0]"), "2001:4860:4860::8888");
/// assert_eq!(normalize("68.105.28.11"), "68.105.28.11");
/// ```
pub fn normalize(addr: &str) -> String {
    normalize_str(addr).to_string()
}

/// Borrowing form of [`normalize`].
pub fn normalize_str(addr: &str) -> &str {
    let mut current = addr;
    loop {
        let mut next = current;
        if let Some(inner) = next.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            next = inner;
        }
        if let Some(pos) = next.find('%') {
            next = &next[..pos];
        }
        if next.len() == current.len() {
            return current;
        }
        current = next;
    }
}

/// Parses `host` as an IP literal after normalization.
///
/// Returns `None` for hostnames that need DNS resolution.
pub fn parse_ip_literal(host: &str) -> Option<IpAddr> {
    normalize_str(host).parse().ok()
}

/// Splits `host:port`, `[host]:port` or `[host%zone]:port`.
///
/// An empty port (`host:`) is port 0.
///
/// The returned host has its brackets removed but is otherwise untouched;
/// callers normalize it before use.
pub fn split_host_port(addr: &str) -> Result<(&str, u16), NetError> {
    let (host, port) = if let Some(rest) = addr.strip_prefix('[') {
        let end = rest
            .find(']')
            .ok_or_else(|| NetError::address_invalid(addr, "missing ']' in address"))?;
        let host = &rest[..end];
        let after = &rest[end + 1..];
        let port = match after.strip_prefix(':') {
            Some(port) => port,
            None if after.is_empty() => {
                return Err(NetError::address_invalid(addr, "missing port in address"))
            }
            None => return Err(NetError::address_invalid(addr, "unexpected data after ']'")),
        };
        if host.contains('[') || host.contains(']') {
            return Err(NetError::address_invalid(addr, "unexpected bracket in address"));
        }
        (host, port)
    } else {
        let colon = addr
            .rfind(':')
            .ok_or_else(|| NetError::address_invalid(addr, "missing port in address"))?;
        let host = &addr[..colon];
        if host.contains(':') {
            return Err(NetError::address_invalid(addr, "too many colons in address"));
        }
        if host.contains('[') || host.contains(']') {
            return Err(NetError::address_invalid(addr, "unexpected bracket in address"));
        }
        (host, &addr[colon + 1..])
    };

    // An empty port means 0, as in `host:`.
    let port = if port.is_empty() {
        0
    } else {
        port.parse::<u16>()
            .map_err(|_| NetError::address_invalid(addr, "invalid port"))?
    };
    Ok((host, port))
}
