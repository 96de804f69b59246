//! ## canaryfw-telemetry::metrics
//! **Prometheus counters for the capture pipeline**
//!
//! The registry is private to the process; `gather_metrics` renders it in
//! text exposition format and `summary` gives the one-line shutdown report.

use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    pub capture_lines: IntCounter,
    pub records: IntCounterVec,
    pub rejected: IntCounterVec,
    pub capture_restarts: IntCounter,
    pub sink_errors: IntCounter,
    pub line_latency: Histogram,
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRecorder {
    /// # Panics
    /// Only if the static metric definitions below are invalid.
    pub fn new() -> Self {
        Self::try_new().expect("metric definitions are valid")
    }

    pub fn try_new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let capture_lines = IntCounter::new(
            "canaryfw_capture_lines_total",
            "Lines read from the capture subprocess",
        )?;
        let records = IntCounterVec::new(
            Opts::new(
                "canaryfw_records_total",
                "Synthetic firewall records written",
            ),
            &["protocol"],
        )?;
        let rejected = IntCounterVec::new(
            Opts::new(
                "canaryfw_probes_rejected_total",
                "Capture lines that produced no record",
            ),
            &["reason"],
        )?;
        let capture_restarts = IntCounter::new(
            "canaryfw_capture_restarts_total",
            "Capture subprocess restarts after failure or exit",
        )?;
        let sink_errors = IntCounter::new(
            "canaryfw_sink_errors_total",
            "Failed writes to the synthetic log sink",
        )?;
        let line_latency = Histogram::with_opts(
            HistogramOpts::new(
                "canaryfw_line_latency_ns",
                "Classify, filter, render and append time per line",
            )
            .buckets(vec![1_000.0, 10_000.0, 100_000.0, 1_000_000.0]),
        )?;

        registry.register(Box::new(capture_lines.clone()))?;
        registry.register(Box::new(records.clone()))?;
        registry.register(Box::new(rejected.clone()))?;
        registry.register(Box::new(capture_restarts.clone()))?;
        registry.register(Box::new(sink_errors.clone()))?;
        registry.register(Box::new(line_latency.clone()))?;

        Ok(Self {
            registry,
            capture_lines,
            records,
            rejected,
            capture_restarts,
            sink_errors,
            line_latency,
        })
    }

    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    #[inline]
    pub fn inc_capture_lines(&self) {
        self.capture_lines.inc();
    }

    #[inline]
    pub fn inc_records(&self, protocol: &str) {
        self.records.with_label_values(&[protocol]).inc();
    }

    #[inline]
    pub fn inc_rejected(&self, reason: &str) {
        self.rejected.with_label_values(&[reason]).inc();
    }

    pub fn inc_capture_restarts(&self) {
        self.capture_restarts.inc();
    }

    pub fn inc_sink_errors(&self) {
        self.sink_errors.inc();
    }

    pub fn records_for(&self, protocol: &str) -> u64 {
        self.records.with_label_values(&[protocol]).get()
    }

    pub fn rejected_for(&self, reason: &str) -> u64 {
        self.rejected.with_label_values(&[reason]).get()
    }

    /// One-line totals for the shutdown log.
    pub fn summary(&self) -> String {
        format!(
            "lines={} tcp={} udp={} restarts={} sink_errors={}",
            self.capture_lines.get(),
            self.records_for("TCP"),
            self.records_for("UDP"),
            self.capture_restarts.get(),
            self.sink_errors.get(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_are_exported() {
        let metrics = MetricsRecorder::new();
        metrics.inc_capture_lines();
        metrics.inc_records("TCP");
        metrics.inc_rejected("broadcast");
        metrics.inc_capture_restarts();

        let text = metrics.gather_metrics().unwrap();
        assert!(text.contains("canaryfw_capture_lines_total 1"));
        assert!(text.contains("canaryfw_records_total{protocol=\"TCP\"} 1"));
        assert!(text.contains("canaryfw_probes_rejected_total{reason=\"broadcast\"} 1"));
        assert!(text.contains("canaryfw_capture_restarts_total 1"));
    }

    #[test]
    fn recorders_do_not_share_state() {
        let a = MetricsRecorder::new();
        let b = MetricsRecorder::new();
        a.inc_records("UDP");
        assert_eq!(a.records_for("UDP"), 1);
        assert_eq!(b.records_for("UDP"), 0);
    }

    #[test]
    fn summary_lists_totals() {
        let metrics = MetricsRecorder::new();
        metrics.inc_capture_lines();
        metrics.inc_capture_lines();
        metrics.inc_records("UDP");
        metrics.inc_sink_errors();
        assert_eq!(
            metrics.summary(),
            "lines=2 tcp=0 udp=1 restarts=0 sink_errors=1"
        );
    }
}
