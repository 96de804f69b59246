//! # canaryfw-core
//!
//! Foundation types for the synthetic probe log emitter: the probe event
//! model, host context discovery and the probe acceptance policy.
//!
//! ### Key Submodules:
//! - `events`: `ProbeEvent` and `Protocol`
//! - `host`: `HostResolver` reading the routing table with fallbacks
//! - `filter`: `ProbeFilter` destination and broadcast checks

pub mod events;
pub mod filter;
pub mod host;

pub use events::{ProbeEvent, Protocol};
pub use filter::{ProbeFilter, RejectReason, Verdict};
pub use host::{HostContext, HostResolver};
