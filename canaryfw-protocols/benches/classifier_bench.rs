#[macro_use]
extern crate criterion;

use criterion::{black_box, Criterion};

use canaryfw_protocols::CaptureLine;

// `tcpdump -nnl -tt` output for a SYN scan probe
const TCP_SYN_LINE: &str = "1718000000.123456 IP 203.0.113.9.40112 > 192.168.1.10.3389: \
                            Flags [S], seq 2381939611, win 1024, options [mss 1460], length 0";

const UDP_LINE: &str = "1718000000.234567 IP 203.0.113.9.40112 > 192.168.1.10.161: UDP, length 40";

const BANNER_LINE: &str =
    "listening on eth0, link-type EN10MB (Ethernet), snapshot length 262144 bytes";

fn benchmark_tcp_classification(c: &mut Criterion) {
    c.bench_function("classify_tcp_syn", |b| {
        b.iter(|| black_box(CaptureLine::parse(black_box(TCP_SYN_LINE))))
    });
}

fn benchmark_udp_classification(c: &mut Criterion) {
    // Falls through the TCP pattern first
    c.bench_function("classify_udp", |b| {
        b.iter(|| black_box(CaptureLine::parse(black_box(UDP_LINE))))
    });
}

fn benchmark_unrecognized(c: &mut Criterion) {
    c.bench_function("classify_banner", |b| {
        b.iter(|| black_box(CaptureLine::parse(black_box(BANNER_LINE))))
    });
}

criterion_group!(
    benches,
    benchmark_tcp_classification,
    benchmark_udp_classification,
    benchmark_unrecognized
);
criterion_main!(benches);
