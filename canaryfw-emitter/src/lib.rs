//! # canaryfw Emitter
//!
//! Turns accepted probe events into firewall-style kernel log records and
//! appends them to a log sink.
//!
//! ### Modules:
//! - `record`: `RecordRenderer`, one syslog line per probe
//! - `sink`: append-only destinations (`FileSink`, `WriterSink`, `MemorySink`)

pub mod record;
pub mod sink;

pub use record::{local_hostname, RecordRenderer, DEFAULT_TCP_TAG, DEFAULT_UDP_TAG};
pub use sink::{FileSink, LogSink, MemorySink, WriterSink, DEFAULT_SINK_PATH};
