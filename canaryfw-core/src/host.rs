//! ## canaryfw-core::host
//! **Host context discovery**
//!
//! Resolves the interface carrying the default route and the address the
//! host uses for outbound traffic. Discovery is best effort: every failure
//! degrades to a fixed fallback so the emitter keeps running on hosts with
//! odd or missing network configuration.

use std::fs;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddrV4, UdpSocket};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Kernel routing table in `/proc` text form.
pub const DEFAULT_ROUTE_TABLE: &str = "/proc/net/route";

/// Interface used when no default route can be found.
pub const FALLBACK_INTERFACE: &str = "eth0";

/// Non-routable target used to learn the outbound source address.
/// Connecting a datagram socket sends nothing on the wire.
pub const DEFAULT_PROBE_TARGET: SocketAddrV4 =
    SocketAddrV4::new(Ipv4Addr::new(10, 255, 255, 255), 1);

/// `RTF_GATEWAY` bit of the route flags column.
const RTF_GATEWAY: u32 = 0x2;

/// Network identity of the host, resolved once per process run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostContext {
    pub interface: String,
    pub host_ip: Ipv4Addr,
}

/// Discovers a [`HostContext`].
#[derive(Clone, Debug)]
pub struct HostResolver {
    route_table: PathBuf,
    fallback_interface: String,
    probe_target: SocketAddrV4,
    interface_override: Option<String>,
    address_override: Option<Ipv4Addr>,
}

impl Default for HostResolver {
    fn default() -> Self {
        Self {
            route_table: PathBuf::from(DEFAULT_ROUTE_TABLE),
            fallback_interface: FALLBACK_INTERFACE.to_string(),
            probe_target: DEFAULT_PROBE_TARGET,
            interface_override: None,
            address_override: None,
        }
    }
}

impl HostResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route_table<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.route_table = path.as_ref().to_path_buf();
        self
    }

    pub fn fallback_interface(mut self, name: impl Into<String>) -> Self {
        self.fallback_interface = name.into();
        self
    }

    pub fn probe_target(mut self, target: SocketAddrV4) -> Self {
        self.probe_target = target;
        self
    }

    /// Pins the interface instead of discovering it.
    pub fn with_interface(mut self, name: Option<String>) -> Self {
        self.interface_override = name;
        self
    }

    /// Pins the host address instead of discovering it.
    pub fn with_address(mut self, address: Option<Ipv4Addr>) -> Self {
        self.address_override = address;
        self
    }

    /// Resolves the host context. Never fails.
    pub fn resolve(&self) -> HostContext {
        let interface = match &self.interface_override {
            Some(name) => name.clone(),
            None => self.discover_interface(),
        };
        let host_ip = match self.address_override {
            Some(ip) => ip,
            None => self.discover_address(),
        };
        debug!(%interface, %host_ip, "Resolved host context");
        HostContext { interface, host_ip }
    }

    fn discover_interface(&self) -> String {
        match fs::read_to_string(&self.route_table) {
            Ok(table) => default_route_interface(&table).unwrap_or_else(|| {
                warn!(
                    "No default route in {}, falling back to {}",
                    self.route_table.display(),
                    self.fallback_interface
                );
                self.fallback_interface.clone()
            }),
            Err(e) => {
                warn!(
                    "Cannot read {}: {e}, falling back to {}",
                    self.route_table.display(),
                    self.fallback_interface
                );
                self.fallback_interface.clone()
            }
        }
    }

    fn discover_address(&self) -> Ipv4Addr {
        outbound_address(self.probe_target).unwrap_or_else(|e| {
            warn!("Cannot determine host address: {e}, falling back to loopback");
            Ipv4Addr::LOCALHOST
        })
    }
}

/// Finds the interface of the default gateway route in `/proc/net/route`
/// text: destination `00000000` with the gateway flag set.
pub fn default_route_interface(table: &str) -> Option<String> {
    table.lines().find_map(|line| {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 4 || fields[1] != "00000000" {
            return None;
        }
        let flags = u32::from_str_radix(fields[3], 16).ok()?;
        (flags & RTF_GATEWAY != 0).then(|| fields[0].to_string())
    })
}

fn outbound_address(target: SocketAddrV4) -> io::Result<Ipv4Addr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
    socket.connect(target)?;
    match socket.local_addr()?.ip() {
        IpAddr::V4(ip) => Ok(ip),
        IpAddr::V6(ip) => Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("bound to non-IPv4 address {ip}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tracing_test::traced_test;

    const ROUTES: &str = "\
Iface\tDestination\tGateway \tFlags\tRefCnt\tUse\tMetric\tMask\t\tMTU\tWindow\tIRTT
wlan0\t0010A8C0\t00000000\t0001\t0\t0\t600\t00FFFFFF\t0\t0\t0
enp3s0\t00000000\t0101A8C0\t0003\t0\t0\t100\t00000000\t0\t0\t0
docker0\t000011AC\t00000000\t0001\t0\t0\t0\t0000FFFF\t0\t0\t0
";

    #[test]
    fn picks_default_gateway_route() {
        assert_eq!(default_route_interface(ROUTES).as_deref(), Some("enp3s0"));
    }

    #[test]
    fn ignores_default_route_without_gateway_flag() {
        let table = "Iface\tDestination\tGateway\tFlags\nlo\t00000000\t00000000\t0001\n";
        assert_eq!(default_route_interface(table), None);
    }

    #[test]
    fn tolerates_garbage_lines() {
        let table = "junk\n\nbr0 00000000 zz ZZ\nbr1 00000000 0101A8C0 0003\n";
        assert_eq!(default_route_interface(table).as_deref(), Some("br1"));
    }

    #[test]
    fn reads_interface_from_route_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(ROUTES.as_bytes()).unwrap();
        let ctx = HostResolver::new()
            .route_table(file.path())
            .with_address(Some(Ipv4Addr::new(192, 168, 1, 10)))
            .resolve();
        assert_eq!(ctx.interface, "enp3s0");
        assert_eq!(ctx.host_ip, Ipv4Addr::new(192, 168, 1, 10));
    }

    #[traced_test]
    #[test]
    fn missing_route_file_falls_back() {
        let ctx = HostResolver::new()
            .route_table("/nonexistent/canaryfw/route")
            .fallback_interface("ens0")
            .resolve();
        assert_eq!(ctx.interface, "ens0");
        assert!(logs_contain("falling back to ens0"));
    }

    #[test]
    fn overrides_skip_discovery() {
        let ctx = HostResolver::new()
            .route_table("/nonexistent/canaryfw/route")
            .with_interface(Some("tap0".into()))
            .with_address(Some(Ipv4Addr::new(10, 1, 2, 3)))
            .resolve();
        assert_eq!(
            ctx,
            HostContext {
                interface: "tap0".into(),
                host_ip: Ipv4Addr::new(10, 1, 2, 3),
            }
        );
    }

    #[test]
    fn resolution_is_idempotent() {
        let resolver = HostResolver::new();
        assert_eq!(resolver.resolve(), resolver.resolve());
    }
}
