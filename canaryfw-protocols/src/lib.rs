//! # canaryfw Protocol Parsers
//!
//! Crate for turning packet-capture text output into probe events.

pub mod tcpdump;

pub use tcpdump::{classify, CaptureLine, Endpoints};
