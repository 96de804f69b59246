//! canaryfw-capture
//!
//! Owns the external packet-capture subprocess: builds the tcpdump command
//! line for the resolved host and exposes its standard output as a stream
//! of text lines.
//!
//! The supervisor only sees the [`CaptureLauncher`] and [`CaptureSession`]
//! traits, so any line source can stand in for tcpdump.

pub mod command;
pub mod error;
pub mod process;
pub mod scripted;
pub mod session;

pub use command::CaptureCommand;
pub use error::CaptureError;
pub use process::{ProcessLauncher, ProcessSession};
pub use scripted::{Script, ScriptEnd, ScriptedLauncher};
pub use session::{CaptureLauncher, CaptureSession};
