//! OpenTelemetry tracing setup and scoped spans.
//!
//! Configures:
//! - Console logging with structured format
//! - Environment-based filter (via RUST_LOG)
//! - OTLP exporter for distributed tracing, bridged from `tracing` events
//!
//! Spans are handed out as [`ScopedSpan`] guards: on creation the span
//! becomes the ambient current span, and on every exit path the span is
//! closed and the previous ambient span restored.

use opentelemetry::trace::{Status, TraceContextExt, Tracer, TracerProvider as _};
use opentelemetry::{global, Context, ContextGuard, KeyValue};
use opentelemetry_sdk::trace::{Tracer as SdkTracer, TracerProvider as SdkTracerProvider};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::error::TelemetryError;

/// Tracer scope name reported to the SDK.
const TRACER_NAME: &str = "beacon";

/// Tracing facade handing out scoped spans.
pub struct Tracing {
    tracer: SdkTracer,
}

impl Tracing {
    fn new(tracer: SdkTracer) -> Self {
        Self { tracer }
    }

    /// Create a facade whose spans are never exported.
    ///
    /// Used by tests and offline runs; span contexts and ambient
    /// propagation behave exactly as in the exporting configuration.
    pub fn without_export() -> Self {
        let provider = SdkTracerProvider::builder().build();
        Self::new(provider.tracer(TRACER_NAME))
    }

    /// Start a span and make it the ambient current span.
    ///
    /// The span is parented on whatever span is ambient at the call site,
    /// so nested calls form a parent-child tree without explicit parent
    /// references. Dropping the returned guard closes the span and
    /// restores the previous ambient span, on normal return and error
    /// propagation alike.
    pub fn start_span(&self, name: &str) -> ScopedSpan {
        let span = self.tracer.start(name.to_string());
        let cx = Context::current_with_span(span);
        let guard = cx.clone().attach();
        ScopedSpan { cx, _guard: guard }
    }

    /// Shut down the global tracer provider, flushing pending spans.
    ///
    /// Export failures are logged by the SDK, not propagated.
    pub fn shutdown(&self) {
        global::shutdown_tracer_provider();
        tracing::info!("tracing shutdown complete");
    }
}

/// A span that is closed when the guard goes out of scope.
///
/// Holds the context that carries the span plus the attachment guard that
/// restores the previous ambient context on drop. Field order matters:
/// the context reference is released before the guard detaches.
pub struct ScopedSpan {
    cx: Context,
    _guard: ContextGuard,
}

impl ScopedSpan {
    /// Set an attribute on the span.
    pub fn set_attribute(&self, attribute: KeyValue) {
        self.cx.span().set_attribute(attribute);
    }

    /// Set the span status.
    pub fn set_status(&self, status: Status) {
        self.cx.span().set_status(status);
    }

    /// Record an error event and mark the span status as error.
    pub fn record_error(&self, err: &dyn std::error::Error) {
        self.cx.span().record_error(err);
        self.cx.span().set_status(Status::error(err.to_string()));
    }
}

/// Initialize tracing: subscriber, OTLP span pipeline, global provider.
///
/// This sets up:
/// - An OTLP batch span exporter against the configured endpoint
/// - Console logging with structured format
/// - Environment-based filter (via `--log-level`, overridable by RUST_LOG)
/// - An OpenTelemetry bridge layer attaching log events to exported spans
///
/// # Errors
///
/// Fails if the OTLP pipeline cannot be installed or if a global
/// subscriber is already set.
pub fn init_tracing(config: &Config) -> Result<Tracing, TelemetryError> {
    use opentelemetry_otlp::WithExportConfig;

    let provider = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(config.otlp_endpoint.clone()),
        )
        .with_trace_config(
            opentelemetry_sdk::trace::Config::default().with_resource(config.resource()),
        )
        .install_batch(opentelemetry_sdk::runtime::Tokio)?;

    global::set_tracer_provider(provider.clone());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},beacon=debug", config.log_level)));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let otel_layer = tracing_opentelemetry::layer().with_tracer(provider.tracer(TRACER_NAME));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(otel_layer)
        .try_init()?;

    tracing::info!(
        service = %config.service_name,
        endpoint = %config.otlp_endpoint,
        "tracing initialized"
    );

    Ok(Tracing::new(provider.tracer(TRACER_NAME)))
}

/// Initialize tracing for tests (only logs errors).
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("error")
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry_sdk::testing::trace::InMemorySpanExporter;

    fn current_span_id() -> opentelemetry::trace::SpanId {
        Context::current().span().span_context().span_id()
    }

    #[test]
    fn test_ambient_context_restored_on_normal_exit() {
        let traces = Tracing::without_export();
        let before = current_span_id();
        {
            let span = traces.start_span("outer");
            span.set_attribute(KeyValue::new("step", 1_i64));
            assert_ne!(current_span_id(), before);
        }
        assert_eq!(current_span_id(), before);
    }

    #[test]
    fn test_ambient_context_restored_on_error_exit() {
        fn failing(traces: &Tracing) -> Result<(), std::io::Error> {
            let span = traces.start_span("will_fail");
            let err = std::io::Error::new(std::io::ErrorKind::Other, "boom");
            span.record_error(&err);
            Err(err)
        }

        let traces = Tracing::without_export();
        let before = current_span_id();
        assert!(failing(&traces).is_err());
        assert_eq!(current_span_id(), before);
    }

    #[test]
    fn test_nested_spans_restore_parent() {
        let traces = Tracing::without_export();
        let _outer = traces.start_span("outer");
        let outer_id = current_span_id();
        {
            let _inner = traces.start_span("inner");
            assert_ne!(current_span_id(), outer_id);
        }
        assert_eq!(current_span_id(), outer_id);
    }

    #[test]
    fn test_span_closed_exactly_once_with_parent_linkage() {
        let exporter = InMemorySpanExporter::default();
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();
        let traces = Tracing::new(provider.tracer("test"));

        {
            let _outer = traces.start_span("outer");
            {
                let _inner = traces.start_span("inner");
            }
        }

        let spans = exporter.get_finished_spans().unwrap();
        assert_eq!(spans.len(), 2, "each span should be closed exactly once");

        let outer = spans.iter().find(|s| s.name == "outer").unwrap();
        let inner = spans.iter().find(|s| s.name == "inner").unwrap();
        assert_eq!(inner.parent_span_id, outer.span_context.span_id());
        assert_eq!(
            inner.span_context.trace_id(),
            outer.span_context.trace_id()
        );
    }
}
