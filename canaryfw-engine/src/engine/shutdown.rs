//! Shutdown coordination between signal handling and the capture supervisor.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use opentelemetry::KeyValue;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::info;

use canaryfw_telemetry::logging::EventLogger;

use super::error::EngineError;

/// `Running -> Draining -> Stopped`, never backwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum ShutdownState {
    Running = 0,
    /// Shutdown requested; no new capture is started.
    Draining = 1,
    Stopped = 2,
}

impl ShutdownState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ShutdownState::Running,
            1 => ShutdownState::Draining,
            _ => ShutdownState::Stopped,
        }
    }
}

impl fmt::Display for ShutdownState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShutdownState::Running => "running",
            ShutdownState::Draining => "draining",
            ShutdownState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Cheap to clone; all clones observe the same state.
#[derive(Clone, Debug)]
pub struct ShutdownController {
    token: CancellationToken,
    state: Arc<AtomicU8>,
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownController {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            state: Arc::new(AtomicU8::new(ShutdownState::Running as u8)),
        }
    }

    pub fn state(&self) -> ShutdownState {
        ShutdownState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Enters `Draining` and cancels the token. Returns `true` only for the
    /// call that performed the transition.
    pub fn request(&self) -> bool {
        let previous = self
            .state
            .fetch_max(ShutdownState::Draining as u8, Ordering::SeqCst);
        self.token.cancel();
        previous == ShutdownState::Running as u8
    }

    /// Terminal state, set once the supervisor has returned.
    pub fn mark_stopped(&self) {
        self.state
            .fetch_max(ShutdownState::Stopped as u8, Ordering::SeqCst);
        self.token.cancel();
    }

    pub fn is_draining(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }
}

/// Waits for SIGINT or SIGTERM and requests shutdown. Returns early if
/// shutdown was requested by other means.
pub async fn listen_for_signals(controller: ShutdownController) -> Result<(), EngineError> {
    let mut sigint = signal(SignalKind::interrupt()).map_err(EngineError::Signal)?;
    let mut sigterm = signal(SignalKind::terminate()).map_err(EngineError::Signal)?;

    let name = tokio::select! {
        _ = sigint.recv() => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
        _ = controller.cancelled() => return Ok(()),
    };

    info!("Received signal to terminate");
    if controller.request() {
        EventLogger::log_event("shutdown_requested", vec![KeyValue::new("signal", name)]).await;
    }
    Ok(())
}
