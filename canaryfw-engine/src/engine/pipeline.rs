//! Per-line processing: classify, filter, render, append.

use std::sync::Arc;
use std::time::Instant;

use canaryfw_core::{ProbeFilter, Protocol, RejectReason, Verdict};
use canaryfw_emitter::{LogSink, RecordRenderer};
use canaryfw_protocols::CaptureLine;
use canaryfw_telemetry::MetricsRecorder;
use tracing::{error, info, trace};

/// Metrics label for capture lines matching neither probe form.
pub const UNRECOGNIZED: &str = "unrecognized";

/// What happened to one capture line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineOutcome {
    Recorded(Protocol),
    Rejected(RejectReason),
    Unrecognized,
    /// Rendered but the sink refused the write.
    SinkFailed(Protocol),
}

pub struct ProbePipeline {
    filter: ProbeFilter,
    renderer: RecordRenderer,
    sink: Box<dyn LogSink>,
    metrics: Arc<MetricsRecorder>,
}

impl ProbePipeline {
    pub fn new(
        filter: ProbeFilter,
        renderer: RecordRenderer,
        sink: impl LogSink + 'static,
        metrics: Arc<MetricsRecorder>,
    ) -> Self {
        Self {
            filter,
            renderer,
            sink: Box::new(sink),
            metrics,
        }
    }

    pub fn metrics(&self) -> &Arc<MetricsRecorder> {
        &self.metrics
    }

    /// Runs one line to completion before returning, so records reach the
    /// sink in capture order.
    pub fn process_line(&mut self, line: &str) -> LineOutcome {
        let started = Instant::now();
        self.metrics.inc_capture_lines();

        let outcome = self.handle(line);
        self.metrics
            .line_latency
            .observe(started.elapsed().as_nanos() as f64);
        outcome
    }

    fn handle(&mut self, line: &str) -> LineOutcome {
        let Some(event) = CaptureLine::parse(line).into_probe() else {
            trace!("Discarding unrecognized capture line");
            self.metrics.inc_rejected(UNRECOGNIZED);
            return LineOutcome::Unrecognized;
        };

        if let Verdict::Reject(reason) = self.filter.verdict(&event) {
            trace!(reason = reason.as_str(), "Probe rejected");
            self.metrics.inc_rejected(reason.as_str());
            return LineOutcome::Rejected(reason);
        }

        let record = self.renderer.render(&event);
        if let Err(e) = self.sink.append(&record) {
            error!("Failed to write {} record: {}", event.protocol, e);
            self.metrics.inc_sink_errors();
            return LineOutcome::SinkFailed(event.protocol);
        }

        self.metrics.inc_records(event.protocol.as_str());
        info!(
            "[{}->LOG] {}:{} -> {}:{}",
            event.protocol,
            event.source.ip(),
            event.source.port(),
            event.destination.ip(),
            event.destination.port()
        );
        LineOutcome::Recorded(event.protocol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canaryfw_emitter::{FileSink, MemorySink};
    use std::net::Ipv4Addr;
    use tracing_test::traced_test;

    const HOST: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 10);

    fn pipeline(sink: impl LogSink + 'static) -> ProbePipeline {
        ProbePipeline::new(
            ProbeFilter::new(HOST),
            RecordRenderer::new("canary", "eth0"),
            sink,
            Arc::new(MetricsRecorder::new()),
        )
    }

    #[traced_test]
    #[test]
    fn tcp_syn_is_recorded_and_acknowledged() {
        let sink = MemorySink::new();
        let mut pipeline = pipeline(sink.clone());

        let outcome = pipeline.process_line(
            "1700000000.123456 IP 10.0.0.5.51000 > 192.168.1.10.22: Flags [S], seq 1, win 64240, length 0",
        );

        assert_eq!(outcome, LineOutcome::Recorded(Protocol::Tcp));
        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert!(records[0].contains("SRC=10.0.0.5 DST=192.168.1.10"));
        assert!(records[0].contains("PROTO=TCP SPT=51000 DPT=22"));
        assert!(logs_contain("[TCP->LOG] 10.0.0.5:51000 -> 192.168.1.10:22"));
        assert_eq!(pipeline.metrics().records_for("TCP"), 1);
    }

    #[test]
    fn udp_datagram_is_recorded() {
        let sink = MemorySink::new();
        let mut pipeline = pipeline(sink.clone());

        let outcome =
            pipeline.process_line("1700000000.2 IP 10.0.0.5.5353 > 192.168.1.10.161: UDP, length 40");

        assert_eq!(outcome, LineOutcome::Recorded(Protocol::Udp));
        assert!(sink.records()[0].contains("kernel: IPTables-Dropped: "));
    }

    #[test]
    fn rejections_are_counted_by_reason() {
        let sink = MemorySink::new();
        let mut pipeline = pipeline(sink.clone());

        assert_eq!(
            pipeline.process_line("IP 10.0.0.5.1 > 10.9.9.9.22: Flags [S]"),
            LineOutcome::Rejected(RejectReason::ForeignDestination)
        );
        assert_eq!(
            pipeline.process_line("tcpdump: verbose output suppressed"),
            LineOutcome::Unrecognized
        );

        assert!(sink.is_empty());
        let metrics = pipeline.metrics();
        assert_eq!(metrics.rejected_for("foreign_destination"), 1);
        assert_eq!(metrics.rejected_for(UNRECOGNIZED), 1);
        assert_eq!(metrics.capture_lines.get(), 2);
    }

    #[traced_test]
    #[test]
    fn sink_failure_is_reported_and_processing_continues() {
        let dir = tempfile::tempdir().unwrap();
        let mut pipeline = pipeline(FileSink::new(dir.path().join("absent").join("kern.log")));
        let line = "IP 10.0.0.5.51000 > 192.168.1.10.22: Flags [S]";

        assert_eq!(
            pipeline.process_line(line),
            LineOutcome::SinkFailed(Protocol::Tcp)
        );
        assert_eq!(
            pipeline.process_line(line),
            LineOutcome::SinkFailed(Protocol::Tcp)
        );
        assert!(logs_contain("Failed to write TCP record"));
        assert_eq!(pipeline.metrics().sink_errors.get(), 2);
    }
}
