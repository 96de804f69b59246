/*!
# Runtime

Wires configuration, host discovery, capture supervision and the record
sink together. `run_daemon` is the long-running emitter; `run_replay` feeds
saved capture output through the same pipeline.
*/

use std::sync::Arc;

use opentelemetry::KeyValue;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{info, instrument};

use canaryfw_capture::{CaptureCommand, ProcessLauncher};
use canaryfw_config::{CanaryConfig, HostConfig};
use canaryfw_core::{HostContext, HostResolver, ProbeFilter};
use canaryfw_emitter::{local_hostname, FileSink, LogSink, RecordRenderer};
use canaryfw_telemetry::{logging::EventLogger, MetricsRecorder};

use crate::engine::{
    listen_for_signals, CaptureSupervisor, EngineError, ProbePipeline, ShutdownController,
};

/// Resolves the interface and address, applying configured overrides.
pub fn resolve_host(config: &HostConfig) -> HostContext {
    HostResolver::new()
        .route_table(&config.route_table)
        .fallback_interface(config.fallback_interface.clone())
        .probe_target(config.probe_target)
        .with_interface(config.interface.clone())
        .with_address(config.address)
        .resolve()
}

/// Builds the classify/filter/render pipeline writing into `sink`.
pub fn build_pipeline(
    config: &CanaryConfig,
    host: &HostContext,
    sink: impl LogSink + 'static,
    metrics: Arc<MetricsRecorder>,
) -> ProbePipeline {
    let filter = ProbeFilter::new(host.host_ip)
        .ignore_sources(config.filter.ignore_sources.clone())
        .ignore_loopback(config.filter.ignore_loopback);

    let hostname = config
        .sink
        .hostname
        .clone()
        .unwrap_or_else(local_hostname);
    let renderer = RecordRenderer::new(hostname, host.interface.clone())
        .tags(config.sink.tcp_tag.clone(), config.sink.udp_tag.clone());

    ProbePipeline::new(filter, renderer, sink, metrics)
}

/// Runs the emitter until SIGINT or SIGTERM.
#[instrument(level = "info", name = "run_daemon", skip_all)]
pub async fn run_daemon(config: CanaryConfig) -> Result<(), EngineError> {
    let metrics = Arc::new(MetricsRecorder::new());
    let host = resolve_host(&config.host);
    info!(
        interface = %host.interface,
        host_ip = %host.host_ip,
        "Monitoring inbound probes"
    );

    let command = CaptureCommand::new(config.capture.program.clone(), &host);
    info!("Capture command: {}", command);
    info!("Writing records to {}", config.sink.path.display());

    let pipeline = build_pipeline(
        &config,
        &host,
        FileSink::new(&config.sink.path),
        metrics.clone(),
    );
    let shutdown = ShutdownController::new();
    let mut supervisor =
        CaptureSupervisor::new(ProcessLauncher::from(&command), pipeline, shutdown.clone())
            .backoff(config.capture.restart_backoff());

    let signals = async {
        let result = listen_for_signals(shutdown.clone()).await;
        if result.is_err() {
            // Stop rather than run with no way to be signalled.
            shutdown.request();
        }
        result
    };
    let supervise = async {
        supervisor.run().await;
        shutdown.mark_stopped();
    };
    let (signal_result, ()) = tokio::join!(signals, supervise);

    info!("Shutdown complete: {}", metrics.summary());
    EventLogger::log_event(
        "emitter_stopped",
        vec![
            KeyValue::new("state", shutdown.state().to_string()),
            KeyValue::new("summary", metrics.summary()),
        ],
    )
    .await;

    signal_result
}

/// Processes every line of `input` and writes records to `sink`.
#[instrument(level = "info", name = "run_replay", skip_all)]
pub async fn run_replay<R>(
    config: &CanaryConfig,
    input: R,
    sink: impl LogSink + 'static,
) -> Result<Arc<MetricsRecorder>, EngineError>
where
    R: AsyncBufRead + Unpin,
{
    let metrics = Arc::new(MetricsRecorder::new());
    let host = resolve_host(&config.host);
    info!(interface = %host.interface, host_ip = %host.host_ip, "Replaying capture output");

    let mut pipeline = build_pipeline(config, &host, sink, metrics.clone());
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        pipeline.process_line(&line);
    }

    info!("Replay complete: {}", metrics.summary());
    Ok(metrics)
}
