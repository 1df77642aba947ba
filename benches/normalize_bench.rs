use criterion::{black_box, criterion_group, criterion_main, Criterion};
use protectnet::dns::{normalize_str, parse_ip_literal, split_host_port};

/// Benchmark the address handling every dial goes through before any
/// socket exists.
fn benchmark_address_parsing(c: &mut Criterion) {
    let inputs = [
        "68.105.28.11",
        "[2001:4860:4860::8888]",
        "[2001:4860:4860::8888%wlan0]",
        "example.com",
    ];

    c.bench_function("normalize_str", |b| {
        b.iter(|| {
            for input in inputs {
                black_box(normalize_str(black_box(input)));
            }
        })
    });

    c.bench_function("split_host_port", |b| {
        b.iter(|| {
            let _ = black_box(split_host_port(black_box("[fe80::1%eth0]:443")));
            let _ = black_box(split_host_port(black_box("example.com:80")));
        })
    });

    c.bench_function("parse_ip_literal", |b| {
        b.iter(|| {
            for input in inputs {
                black_box(parse_ip_literal(black_box(input)));
            }
        })
    });
}

criterion_group!(benches, benchmark_address_parsing);
criterion_main!(benches);
