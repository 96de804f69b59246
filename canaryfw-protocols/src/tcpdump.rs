//! ## canaryfw-protocols::tcpdump
//! Classifier for numeric tcpdump summary lines.
//!
//! Only two summary shapes matter:
//!
//! ```text
//! 1718000000.123456 IP 10.0.0.5.51000 > 192.168.1.10.22: Flags [S], seq 1, win 64240, length 0
//! 1718000000.234567 IP 10.0.0.5.51000 > 192.168.1.10.161: UDP, length 40
//! ```
//!
//! Everything else tcpdump prints (banners, warnings, SYN-ACKs, IPv6) is
//! `Unrecognized`. The patterns are unanchored, so the leading timestamp
//! and `IP` tag do not matter.

use std::net::{Ipv4Addr, SocketAddrV4};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use canaryfw_core::{ProbeEvent, Protocol};

static TCP_SYN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+\.\d+\.\d+\.\d+)\.(\d+) > (\d+\.\d+\.\d+\.\d+)\.(\d+): Flags \[S\]")
        .expect("TCP SYN pattern is valid")
});

static UDP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+\.\d+\.\d+\.\d+)\.(\d+) > (\d+\.\d+\.\d+\.\d+)\.(\d+): UDP")
        .expect("UDP pattern is valid")
});

/// Source and destination of a classified line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Endpoints {
    pub source: SocketAddrV4,
    pub destination: SocketAddrV4,
}

/// Result of classifying one line of capture output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureLine {
    TcpSyn(Endpoints),
    Udp(Endpoints),
    Unrecognized,
}

impl CaptureLine {
    /// Classifies a raw line. The TCP pattern is tried first; a line that
    /// matches it is never tried against the UDP pattern.
    pub fn parse(line: &str) -> Self {
        if let Some(caps) = TCP_SYN.captures(line) {
            return endpoints(&caps).map_or(CaptureLine::Unrecognized, CaptureLine::TcpSyn);
        }
        if let Some(caps) = UDP.captures(line) {
            return endpoints(&caps).map_or(CaptureLine::Unrecognized, CaptureLine::Udp);
        }
        CaptureLine::Unrecognized
    }

    pub fn protocol(&self) -> Option<Protocol> {
        match self {
            CaptureLine::TcpSyn(_) => Some(Protocol::Tcp),
            CaptureLine::Udp(_) => Some(Protocol::Udp),
            CaptureLine::Unrecognized => None,
        }
    }

    /// Turns a recognized line into a probe event stamped with the current time.
    pub fn into_probe(self) -> Option<ProbeEvent> {
        let (protocol, ends) = match self {
            CaptureLine::TcpSyn(ends) => (Protocol::Tcp, ends),
            CaptureLine::Udp(ends) => (Protocol::Udp, ends),
            CaptureLine::Unrecognized => return None,
        };
        Some(ProbeEvent::new(protocol, ends.source, ends.destination))
    }
}

/// Classifies a raw capture line into a probe event, or `None` for lines
/// that are not TCP SYN or UDP summaries.
#[inline]
pub fn classify(line: &str) -> Option<ProbeEvent> {
    CaptureLine::parse(line).into_probe()
}

fn endpoints(caps: &Captures<'_>) -> Option<Endpoints> {
    let addr = |ip: usize, port: usize| -> Option<SocketAddrV4> {
        let ip: Ipv4Addr = caps.get(ip)?.as_str().parse().ok()?;
        let port: u16 = caps.get(port)?.as_str().parse().ok()?;
        Some(SocketAddrV4::new(ip, port))
    };
    Some(Endpoints {
        source: addr(1, 2)?,
        destination: addr(3, 4)?,
    })
}
