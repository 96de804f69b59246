//! Probe event types.

use std::fmt;
use std::net::{Ipv4Addr, SocketAddrV4};

use chrono::{DateTime, Local};

/// Transport protocol of an observed probe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    /// Upper-case name as it appears in `PROTO=` fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "TCP",
            Protocol::Udp => "UDP",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single inbound connection or datagram attempt toward the host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProbeEvent {
    pub protocol: Protocol,
    pub source: SocketAddrV4,
    pub destination: SocketAddrV4,
    /// Local wall-clock time at which the capture line was read.
    pub observed_at: DateTime<Local>,
}

impl ProbeEvent {
    #[inline]
    pub fn new(protocol: Protocol, source: SocketAddrV4, destination: SocketAddrV4) -> Self {
        Self {
            protocol,
            source,
            destination,
            observed_at: Local::now(),
        }
    }

    /// Overrides the observation time, used when replaying saved capture output.
    pub fn observed_at(mut self, at: DateTime<Local>) -> Self {
        self.observed_at = at;
        self
    }

    pub fn source_ip(&self) -> Ipv4Addr {
        *self.source.ip()
    }

    pub fn destination_ip(&self) -> Ipv4Addr {
        *self.destination.ip()
    }
}
