//! ## canaryfw-emitter::record
//! **Firewall-style record synthesis**
//!
//! Records imitate netfilter `LOG` target output as written by the kernel
//! into syslog:
//!
//! ```text
//! Oct  3 14:02:11 canary kernel: canaryfw: IN=eth0 OUT= MAC=.. SRC=.. DST=.. LEN=60 .. PROTO=TCP SPT=.. DPT=.. WINDOW=29200 RES=0x00 SYN URGP=0
//! Oct  3 14:02:11 canary kernel: IPTables-Dropped: IN=eth0 OUT= MAC=.. SRC=.. DST=.. LEN=60 .. PROTO=UDP SPT=.. DPT=.. LEN=42
//! ```
//!
//! The link-layer address and packet ID are fresh random values per record.

use std::fmt::Write;

use canaryfw_core::{ProbeEvent, Protocol};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Log prefix of synthesized TCP records.
pub const DEFAULT_TCP_TAG: &str = "canaryfw";
/// Log prefix of synthesized UDP records.
pub const DEFAULT_UDP_TAG: &str = "IPTables-Dropped";

/// syslog timestamp, day of month space padded.
const TIMESTAMP_FORMAT: &str = "%b %e %H:%M:%S";

/// Name of this machine, `localhost` if it cannot be determined.
pub fn local_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .unwrap_or_else(|| "localhost".to_string())
}

/// Renders probe events as kernel log lines.
pub struct RecordRenderer<R = StdRng> {
    hostname: String,
    interface: String,
    tcp_tag: String,
    udp_tag: String,
    rng: R,
}

impl RecordRenderer<StdRng> {
    pub fn new(hostname: impl Into<String>, interface: impl Into<String>) -> Self {
        Self::with_rng(hostname, interface, StdRng::from_os_rng())
    }
}

impl<R: Rng> RecordRenderer<R> {
    pub fn with_rng(hostname: impl Into<String>, interface: impl Into<String>, rng: R) -> Self {
        Self {
            hostname: hostname.into(),
            interface: interface.into(),
            tcp_tag: DEFAULT_TCP_TAG.to_string(),
            udp_tag: DEFAULT_UDP_TAG.to_string(),
            rng,
        }
    }

    pub fn tags(mut self, tcp: impl Into<String>, udp: impl Into<String>) -> Self {
        self.tcp_tag = tcp.into();
        self.udp_tag = udp.into();
        self
    }

    /// One record line without trailing newline.
    pub fn render(&mut self, event: &ProbeEvent) -> String {
        let mac = self.random_mac();
        let id: u32 = self.rng.random_range(10000..=99999);
        let tag = match event.protocol {
            Protocol::Tcp => &self.tcp_tag,
            Protocol::Udp => &self.udp_tag,
        };

        let mut line = format!(
            "{} {} kernel: {}: IN={} OUT= MAC={} SRC={} DST={} LEN=60 TOS=0x00 PREC=0x00 TTL=64 ID={} DF PROTO={} SPT={} DPT={}",
            event.observed_at.format(TIMESTAMP_FORMAT),
            self.hostname,
            tag,
            self.interface,
            mac,
            event.source.ip(),
            event.destination.ip(),
            id,
            event.protocol,
            event.source.port(),
            event.destination.port(),
        );
        match event.protocol {
            Protocol::Tcp => line.push_str(" WINDOW=29200 RES=0x00 SYN URGP=0"),
            Protocol::Udp => line.push_str(" LEN=42"),
        }
        line
    }

    fn random_mac(&mut self) -> String {
        let octets: [u8; 6] = self.rng.random();
        let mut mac = String::with_capacity(17);
        for (i, octet) in octets.iter().enumerate() {
            if i > 0 {
                mac.push(':');
            }
            let _ = write!(mac, "{:02x}", octet);
        }
        mac
    }
}
