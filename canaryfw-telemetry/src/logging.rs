//! ## canaryfw-telemetry::logging
//! **Diagnostic logging with tracing and OpenTelemetry attributes**
//!
//! Level defaults to `info` and follows `RUST_LOG` when set. Output goes to
//! stderr because the `replay` command prints records on stdout.

use opentelemetry::KeyValue;
use tracing::{info_span, Instrument};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Clone)]
pub struct EventLogger;

impl EventLogger {
    /// Installs the global subscriber. Later calls are no-ops.
    pub fn init() {
        let _ = fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_writer(std::io::stderr)
            .with_thread_names(true)
            .with_span_events(FmtSpan::NONE)
            .try_init();
    }

    /// Emits a lifecycle event (capture started/exited, shutdown) with the
    /// event name in `event` and the attributes as `key=value` pairs.
    pub async fn log_event(event_type: &str, attributes: Vec<KeyValue>) {
        let span = info_span!("lifecycle_event", otel.kind = "INTERNAL");
        let attrs = format_attributes(&attributes);

        async {
            tracing::info!(event = event_type, attrs = %attrs, "Lifecycle event");
        }
        .instrument(span)
        .await
    }
}

fn format_attributes(attributes: &[KeyValue]) -> String {
    attributes
        .iter()
        .map(|kv| format!("{}={}", kv.key, kv.value))
        .collect::<Vec<_>>()
        .join(" ")
}
