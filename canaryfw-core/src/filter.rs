//! ## canaryfw-core::filter
//! **Acceptance policy for classified probes**
//!
//! The capture filter already restricts traffic to the host address, but
//! the host address can change underneath a running capture, so every
//! event is checked again here before a record is written.

use std::net::{IpAddr, Ipv4Addr};

use ipnetwork::IpNetwork;

use crate::events::{ProbeEvent, Protocol};

/// Why a probe was not logged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    /// Destination is not the resolved host address.
    ForeignDestination,
    /// UDP datagram toward a broadcast address.
    Broadcast,
    /// Source is on the ignore list or is loopback while loopback is ignored.
    IgnoredSource,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::ForeignDestination => "foreign_destination",
            RejectReason::Broadcast => "broadcast",
            RejectReason::IgnoredSource => "ignored_source",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject(RejectReason),
}

#[derive(Clone, Debug)]
pub struct ProbeFilter {
    host_ip: Ipv4Addr,
    ignore_sources: Vec<IpNetwork>,
    ignore_loopback: bool,
}

impl ProbeFilter {
    pub fn new(host_ip: Ipv4Addr) -> Self {
        Self {
            host_ip,
            ignore_sources: Vec::new(),
            ignore_loopback: false,
        }
    }

    pub fn ignore_sources(mut self, networks: Vec<IpNetwork>) -> Self {
        self.ignore_sources = networks;
        self
    }

    pub fn ignore_loopback(mut self, ignore: bool) -> Self {
        self.ignore_loopback = ignore;
        self
    }

    /// Destination mismatch is checked first and wins over every other reason.
    pub fn verdict(&self, event: &ProbeEvent) -> Verdict {
        if event.destination_ip() != self.host_ip {
            return Verdict::Reject(RejectReason::ForeignDestination);
        }
        if event.protocol == Protocol::Udp && is_broadcast(event.destination_ip()) {
            return Verdict::Reject(RejectReason::Broadcast);
        }
        if self.is_ignored_source(event.source_ip()) {
            return Verdict::Reject(RejectReason::IgnoredSource);
        }
        Verdict::Accept
    }

    #[inline]
    pub fn accept(&self, event: &ProbeEvent) -> bool {
        self.verdict(event) == Verdict::Accept
    }

    fn is_ignored_source(&self, source: Ipv4Addr) -> bool {
        (self.ignore_loopback && source.is_loopback())
            || self
                .ignore_sources
                .iter()
                .any(|net| net.contains(IpAddr::V4(source)))
    }
}

/// Limited broadcast, or any address whose last octet is 255.
///
/// This is a heuristic and not subnet aware: `10.0.1.255` inside a /16 is
/// treated as broadcast too.
pub fn is_broadcast(ip: Ipv4Addr) -> bool {
    ip.is_broadcast() || ip.octets()[3] == 255
}
