//! Beacon: an OpenTelemetry instrumentation demo.
//!
//! Beacon exercises the four standard metric instrument kinds (Counter,
//! Histogram, Gauge, UpDownCounter) and scoped spans, exporting everything
//! over OTLP/gRPC to a collector.
//!
//! # Architecture
//!
//! - **Thin facade**: instrument registration and span scoping live here;
//!   batching, aggregation, and export belong to the OpenTelemetry SDK
//! - **Scenario driven**: each demo kind runs a fixed sequence of facade
//!   calls simulating a realistic workload
//! - **Observable**: structured logs via `tracing`, bridged into exported
//!   spans
//!
//! # Modules
//!
//! - [`config`]: CLI and environment configuration
//! - [`demo`]: scenario driver and workload simulators
//! - [`error`]: error types for configuration, metrics, and telemetry setup
//! - [`observability`]: metrics and tracing facades

// Lint configuration
#![warn(clippy::all)]
#![allow(
    clippy::module_name_repetitions, // demo::DemoReport is fine
    clippy::must_use_candidate,      // Not all functions need #[must_use]
    clippy::missing_errors_doc,      // Error docs can be verbose
    clippy::missing_panics_doc       // Panic docs can be verbose
)]

pub mod config;
pub mod demo;
pub mod error;
pub mod observability;

use uuid::Uuid;

/// Generate a new UUIDv7 (time-sortable) run ID.
///
/// Each demo run is tagged with one of these so that spans from separate
/// runs can be told apart in the tracing backend.
#[must_use]
pub fn generate_run_id() -> String {
    Uuid::now_v7().to_string()
}
