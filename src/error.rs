//! Error types for Beacon.
//!
//! Configuration errors fail at startup, before any telemetry pipeline is
//! installed. Instrumentation errors surface at the facade boundary; delivery
//! failures are the exporter's concern and never appear here.

use thiserror::Error;

use crate::observability::metrics::InstrumentKind;

/// Errors raised while validating the parsed configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The service name was empty or whitespace-only.
    #[error("service name must not be empty")]
    EmptyServiceName,

    /// The OTLP endpoint was not a syntactically valid http(s) URI.
    #[error("invalid OTLP endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// A `--resource-attr` value was not of the form `key=value`.
    #[error("invalid resource attribute '{0}': expected key=value")]
    InvalidResourceAttribute(String),
}

/// Errors raised by the metrics facade.
#[derive(Debug, Error)]
pub enum MetricError {
    /// An instrument name was re-registered under a different kind.
    ///
    /// Instrument names are globally unique within a process; re-creating
    /// an instrument with the same name and kind returns the cached handle
    /// instead.
    #[error("instrument '{name}' already registered as {existing}, requested {requested}")]
    KindMismatch {
        name: String,
        existing: InstrumentKind,
        requested: InstrumentKind,
    },

    /// A counter was asked to record a negative increment.
    #[error("counter '{name}' rejects negative increment {value}")]
    NegativeIncrement { name: String, value: f64 },
}

/// Errors raised while installing the telemetry pipelines at startup.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The OTLP trace pipeline could not be installed.
    #[error("failed to install OTLP trace pipeline: {0}")]
    TracePipeline(#[from] opentelemetry::trace::TraceError),

    /// The global tracing subscriber could not be initialized.
    #[error("failed to initialize tracing subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}

/// Errors raised while running a demo scenario.
#[derive(Debug, Error)]
pub enum DemoError {
    /// A facade call was rejected.
    #[error(transparent)]
    Metric(#[from] MetricError),

    /// A spawned workload task panicked or was cancelled.
    #[error("workload task failed: {0}")]
    Workload(#[from] tokio::task::JoinError),
}
