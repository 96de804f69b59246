//! Capture subprocess supervision.
//!
//! One sequential loop: launch a capture, feed every line through the
//! pipeline, and on exit or failure wait out the backoff and launch again.
//! Shutdown is observed both while reading and while backing off; a live
//! session is terminated so a read blocked on an idle interface returns.

use std::time::Duration;

use opentelemetry::KeyValue;
use tokio::time::sleep;
use tracing::{info, instrument, warn};

use canaryfw_capture::{CaptureError, CaptureLauncher, CaptureSession};
use canaryfw_telemetry::logging::EventLogger;

use super::pipeline::ProbePipeline;
use super::shutdown::ShutdownController;

/// Delay between a capture ending and the next launch.
pub const DEFAULT_RESTART_BACKOFF: Duration = Duration::from_secs(3);

/// How a capture session ended.
#[derive(Debug)]
pub enum SessionEnd {
    /// Output closed without a shutdown request.
    Exited,
    /// Reading output failed.
    Failed(CaptureError),
    /// Shutdown was requested and the session terminated.
    Cancelled,
}

pub struct CaptureSupervisor<L> {
    launcher: L,
    pipeline: ProbePipeline,
    shutdown: ShutdownController,
    backoff: Duration,
}

impl<L: CaptureLauncher> CaptureSupervisor<L> {
    pub fn new(launcher: L, pipeline: ProbePipeline, shutdown: ShutdownController) -> Self {
        Self {
            launcher,
            pipeline,
            shutdown,
            backoff: DEFAULT_RESTART_BACKOFF,
        }
    }

    pub fn backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn pipeline(&self) -> &ProbePipeline {
        &self.pipeline
    }

    /// Runs until shutdown is requested. Capture failures never end the loop.
    #[instrument(level = "info", name = "capture_supervisor", skip_all)]
    pub async fn run(&mut self) {
        let mut generation: u64 = 0;

        while !self.shutdown.is_draining() {
            generation += 1;
            match self.launcher.launch().await {
                Ok(session) => {
                    EventLogger::log_event(
                        "capture_started",
                        vec![KeyValue::new("generation", generation as i64)],
                    )
                    .await;

                    match self.drain(session).await {
                        SessionEnd::Cancelled => break,
                        SessionEnd::Exited => warn!("Capture process exited unexpectedly"),
                        SessionEnd::Failed(e) => warn!("Capture failed: {}", e),
                    }
                    EventLogger::log_event(
                        "capture_exited",
                        vec![KeyValue::new("generation", generation as i64)],
                    )
                    .await;
                }
                Err(e) => warn!("Failed to start capture: {}", e),
            }

            if self.shutdown.is_draining() {
                break;
            }
            info!("Restarting capture in {:?}", self.backoff);
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = sleep(self.backoff) => {}
            }
            self.pipeline.metrics().inc_capture_restarts();
        }

        info!("Capture supervisor stopped");
    }

    async fn drain(&mut self, mut session: Box<dyn CaptureSession>) -> SessionEnd {
        loop {
            let next = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    if let Err(e) = session.terminate().await {
                        warn!("Failed to terminate capture: {}", e);
                    }
                    return SessionEnd::Cancelled;
                }
                next = session.next_line() => next,
            };

            match next {
                Ok(Some(line)) => {
                    self.pipeline.process_line(&line);
                }
                Ok(None) => return SessionEnd::Exited,
                Err(e) => {
                    if let Err(e) = session.terminate().await {
                        warn!("Failed to terminate capture: {}", e);
                    }
                    return SessionEnd::Failed(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::sync::Arc;

    use canaryfw_capture::{Script, ScriptedLauncher};
    use canaryfw_core::ProbeFilter;
    use canaryfw_emitter::{MemorySink, RecordRenderer};
    use canaryfw_telemetry::MetricsRecorder;
    use tokio::time::Instant;
    use tracing::Instrument;
    use tracing_test::traced_test;

    const SYN: &str = "IP 10.0.0.5.51000 > 192.168.1.10.22: Flags [S]";

    fn supervisor(
        launcher: ScriptedLauncher,
        shutdown: ShutdownController,
    ) -> (CaptureSupervisor<ScriptedLauncher>, MemorySink) {
        let sink = MemorySink::new();
        let pipeline = ProbePipeline::new(
            ProbeFilter::new(Ipv4Addr::new(192, 168, 1, 10)),
            RecordRenderer::new("canary", "eth0"),
            sink.clone(),
            Arc::new(MetricsRecorder::new()),
        );
        (CaptureSupervisor::new(launcher, pipeline, shutdown), sink)
    }

    #[tokio::test(start_paused = true)]
    #[traced_test]
    async fn restarts_after_each_exit_with_backoff() {
        let launcher = ScriptedLauncher::new([
            Script::exits([SYN]),
            Script::fails([SYN]),
            Script::SpawnFailure,
            Script::exits(Vec::<String>::new()),
        ]);
        let shutdown = ShutdownController::new();
        let (mut supervisor, sink) = supervisor(launcher.clone(), shutdown.clone());

        let started = Instant::now();
        let task = tokio::spawn(
            async move {
                supervisor.run().await;
                supervisor
            }
            .in_current_span(),
        );

        // Four scripted failures, then an idle fifth capture.
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(launcher.launches(), 5);
        assert!(!task.is_finished());

        let times = launcher.launch_times();
        assert!(times[0] - started < Duration::from_millis(10));
        for pair in times.windows(2) {
            let gap = pair[1] - pair[0];
            assert!(gap >= DEFAULT_RESTART_BACKOFF, "gap {gap:?}");
            assert!(gap < DEFAULT_RESTART_BACKOFF + Duration::from_millis(10), "gap {gap:?}");
        }

        shutdown.request();
        let supervisor = task.await.unwrap();
        assert_eq!(sink.len(), 2);
        assert_eq!(supervisor.pipeline().metrics().capture_restarts.get(), 4);
        assert_eq!(launcher.launches(), 5);

        // The spawn failure never starts; the cancelled fifth never exits.
        logs_assert(|lines: &[&str]| {
            let count = |event: &str| {
                let field = format!("event=\"{event}\"");
                lines.iter().filter(|line| line.contains(&field)).count()
            };
            match (count("capture_started"), count("capture_exited")) {
                (4, 3) => Ok(()),
                counts => Err(format!("started/exited events: {counts:?}")),
            }
        });
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_terminates_live_session_and_stops_relaunching() {
        let launcher = ScriptedLauncher::new([Script::hangs([SYN])]);
        let shutdown = ShutdownController::new();
        let (mut supervisor, sink) = supervisor(launcher.clone(), shutdown.clone());
        let task = tokio::spawn(async move { supervisor.run().await });

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(sink.len(), 1);

        shutdown.request();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("supervisor stops promptly")
            .unwrap();

        assert_eq!(launcher.terminations(), 1);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(launcher.launches(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_during_backoff_skips_relaunch() {
        let launcher = ScriptedLauncher::new([Script::exits(Vec::<String>::new())]);
        let shutdown = ShutdownController::new();
        let (supervisor, _sink) = supervisor(launcher.clone(), shutdown.clone());
        let mut supervisor = supervisor.backoff(Duration::from_secs(10));
        let task = tokio::spawn(async move { supervisor.run().await });

        tokio::time::sleep(Duration::from_secs(2)).await;
        shutdown.request();
        task.await.unwrap();

        assert_eq!(launcher.launches(), 1);
        assert_eq!(launcher.terminations(), 0);
    }

    #[tokio::test]
    async fn already_draining_never_launches() {
        let launcher = ScriptedLauncher::default();
        let shutdown = ShutdownController::new();
        shutdown.request();
        let (mut supervisor, _sink) = supervisor(launcher.clone(), shutdown);

        supervisor.run().await;
        assert_eq!(launcher.launches(), 0);
    }
}
