//! Address Normalization Tests
//!
//! Covers:
//! - Bracket and zone stripping through the public API
//! - `host:port` splitting edge cases
//! - Literal parsing used to skip DNS

use protectnet::dns::{normalize, normalize_str, parse_ip_literal, split_host_port};
use protectnet::NetError;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

#[test]
fn test_normalize_forms() {
    let cases = [
        ("[68.105.28.11]", "68.105.28.11"),
        ("2001:4860:4860::8888", "2001:4860:4860::8888"),
        ("[2001:4860:4860::8888]", "2001:4860:4860::8888"),
        ("2001:4860:4860::8888%wlan0", "2001:4860:4860::8888"),
        ("[2001:4860:4860::8888%wlan0]", "2001:4860:4860::8888"),
        ("fe80::1%25eth0", "fe80::1"),
        ("example.com", "example.com"),
    ];
    for (input, expected) in cases {
        assert_eq!(normalize(input), expected, "normalize({input:?})");
        assert_eq!(normalize_str(input), expected, "normalize_str({input:?})");
    }
}

#[test]
fn test_normalize_never_leaves_zone_or_brackets() {
    for input in ["[fe80::1%eth0]", "[[fe80::1]]", "fe80::1%", "[%]"] {
        let out = normalize(input);
        assert!(!out.contains('%'), "{input:?} -> {out:?}");
        assert_eq!(normalize(&out), out);
    }
}

#[test]
fn test_split_host_port() {
    assert_eq!(split_host_port("example.com:80").unwrap(), ("example.com", 80));
    assert_eq!(split_host_port("10.0.0.1:0").unwrap(), ("10.0.0.1", 0));
    assert_eq!(split_host_port("[::1]:53").unwrap(), ("::1", 53));
    assert_eq!(split_host_port("[fe80::1%eth0]:443").unwrap(), ("fe80::1%eth0", 443));
    assert_eq!(split_host_port(":8080").unwrap(), ("", 8080));
    assert_eq!(split_host_port("10.0.0.1:").unwrap(), ("10.0.0.1", 0));
}

#[test]
fn test_split_host_port_rejects() {
    for input in [
        "example.com",
        "::1:53",
        "[::1]",
        "[::1]x:53",
        "[::1:53",
        "example.com:http",
        "example.com:65536",
        "example.com:-1",
    ] {
        let err = split_host_port(input).unwrap_err();
        assert!(
            matches!(err, NetError::AddressInvalid { ref addr, .. } if addr == input),
            "{input:?} gave {err:?}"
        );
        assert_eq!(err.as_i32(), -108);
    }
}

#[test]
fn test_parse_ip_literal() {
    assert_eq!(
        parse_ip_literal("[10.1.2.3]"),
        Some(IpAddr::V4(Ipv4Addr::new(10, 1, 2, 3)))
    );
    assert_eq!(
        parse_ip_literal("fe80::1%wlan0"),
        Some(IpAddr::V6("fe80::1".parse::<Ipv6Addr>().unwrap()))
    );
    assert_eq!(parse_ip_literal("example.com"), None);
    assert_eq!(parse_ip_literal("999.1.1.1"), None);
    assert_eq!(parse_ip_literal(""), None);
}
