//! ## canaryfw-core::events
//! **Probe events produced from capture output**
//!
//! One `ProbeEvent` exists per classified capture line and lives for a
//! single iteration of the capture loop.

pub mod probe;

pub use probe::{ProbeEvent, Protocol};
