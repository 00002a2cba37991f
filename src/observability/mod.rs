//! OpenTelemetry observability facades.
//!
//! Provides:
//! - Metrics facade: instrument registry with cached, typed handles
//! - Tracing facade: scoped spans with ambient-context propagation
//!
//! Both facades delegate batching, aggregation, and OTLP export to the
//! OpenTelemetry SDK; nothing in this crate talks to the network directly.

pub mod metrics;
pub mod tracing;
