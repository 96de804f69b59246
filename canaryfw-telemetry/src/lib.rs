//! # canaryfw Telemetry
//!
//! Crate for diagnostic logging and metrics. Nothing here writes to the
//! synthetic log sink; diagnostics go to stderr only.

pub mod logging;
pub mod metrics;

pub use logging::EventLogger;
pub use metrics::MetricsRecorder;
