//! Seam between the capture supervisor and whatever produces capture lines.

use async_trait::async_trait;

use crate::error::CaptureError;

/// A running capture producing text lines.
#[async_trait]
pub trait CaptureSession: Send {
    /// Next line of capture output without its line terminator.
    ///
    /// `Ok(None)` means the capture closed its output and has exited. Must
    /// be cancel safe: dropping the future loses no line.
    async fn next_line(&mut self) -> Result<Option<String>, CaptureError>;

    /// Stops the capture and reaps it.
    async fn terminate(&mut self) -> Result<(), CaptureError>;
}

/// Starts capture sessions. Called once per (re)start.
#[async_trait]
pub trait CaptureLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn CaptureSession>, CaptureError>;
}
