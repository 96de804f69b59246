//! Host discovery configuration.
//!
//! Defaults mirror the fixed discovery behavior: routing table from
//! `/proc`, `eth0` and loopback as fallbacks. The optional `interface` and
//! `address` pin the values instead of discovering them.

use std::net::{Ipv4Addr, SocketAddrV4};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::validation;

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct HostConfig {
    /// Routing table in `/proc/net/route` format.
    #[serde(default = "default_route_table")]
    pub route_table: PathBuf,

    /// Interface used when no default route is found.
    #[validate(custom(function = validation::validate_interface))]
    #[serde(default = "default_fallback_interface")]
    pub fallback_interface: String,

    /// Datagram target used to learn the outbound source address.
    #[serde(default = "default_probe_target")]
    pub probe_target: SocketAddrV4,

    #[validate(custom(function = validation::validate_interface))]
    #[serde(default)]
    pub interface: Option<String>,

    #[serde(default)]
    pub address: Option<Ipv4Addr>,
}

fn default_route_table() -> PathBuf {
    PathBuf::from("/proc/net/route")
}

fn default_fallback_interface() -> String {
    "eth0".into()
}

fn default_probe_target() -> SocketAddrV4 {
    SocketAddrV4::new(Ipv4Addr::new(10, 255, 255, 255), 1)
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            route_table: default_route_table(),
            fallback_interface: default_fallback_interface(),
            probe_target: default_probe_target(),
            interface: None,
            address: None,
        }
    }
}
