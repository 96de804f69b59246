//! tcpdump command line for probe capture.

use std::fmt;
use std::net::Ipv4Addr;

use canaryfw_core::HostContext;

/// Capture invocation scoped to one interface and host address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureCommand {
    program: String,
    interface: String,
    host_ip: Ipv4Addr,
}

impl CaptureCommand {
    pub fn new(program: impl Into<String>, host: &HostContext) -> Self {
        Self {
            program: program.into(),
            interface: host.interface.clone(),
            host_ip: host.host_ip,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// SYN-without-ACK TCP segments or any UDP datagram, addressed to the host.
    pub fn filter_expression(&self) -> String {
        format!(
            "(tcp[tcpflags] & tcp-syn != 0 and tcp[tcpflags] & tcp-ack == 0 or udp) and dst host {}",
            self.host_ip
        )
    }

    /// `-nn` numeric hosts and ports, `-l` line-buffered stdout, `-tt` epoch timestamps.
    pub fn args(&self) -> Vec<String> {
        vec![
            "-nnl".into(),
            "-tt".into(),
            "-i".into(),
            self.interface.clone(),
            self.filter_expression(),
        ]
    }
}

impl fmt::Display for CaptureCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -nnl -tt -i {} '{}'",
            self.program,
            self.interface,
            self.filter_expression()
        )
    }
}
