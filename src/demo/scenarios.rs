//! Demo scenarios, one per instrument kind plus the combined runs.
//!
//! Each scenario opens a span, registers its instruments through the
//! metrics facade, and emits a fixed number of paced measurements with
//! realistic attribute sets.

use opentelemetry::KeyValue;
use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;

use super::workload::Workload;
use super::Measurements;
use crate::error::DemoError;
use crate::observability::metrics::Metrics;
use crate::observability::tracing::Tracing;

/// Event types cycled through by the counter scenario.
const EVENT_TYPES: [&str; 4] = ["user_login", "user_logout", "page_view", "api_call"];

/// Operations observed by the histogram scenario: (name, mean seconds, spread).
const OPERATIONS: [(&str, f64, f64); 4] = [
    ("database_query", 0.1, 0.05),
    ("api_call", 0.2, 0.1),
    ("file_processing", 0.5, 0.2),
    ("calculation", 0.05, 0.02),
];

/// Counter scenario: 20 monotonic increments across cycling event types.
pub async fn counter_demo(
    metrics: &Metrics,
    traces: &Tracing,
    pace: Duration,
) -> Result<Measurements, DemoError> {
    tracing::info!("=== counter demo ===");
    let span = traces.start_span("counter_demo");

    let events = metrics.create_counter("demo_events_total", "Total number of demo events", "1")?;

    let mut recorded = Measurements {
        spans_opened: 1,
        ..Measurements::default()
    };
    for i in 0..20 {
        let event_type = EVENT_TYPES[i % EVENT_TYPES.len()];
        events.add(1.0, &[KeyValue::new("event_type", event_type)])?;
        recorded.counter_adds += 1;
        tracing::info!(event_type, "recorded counter event");
        sleep(pace).await;
    }

    span.set_attribute(KeyValue::new("events_generated", 20_i64));
    Ok(recorded)
}

/// Histogram scenario: 15 duration observations with per-operation profiles.
pub async fn histogram_demo(
    metrics: &Metrics,
    traces: &Tracing,
    pace: Duration,
) -> Result<Measurements, DemoError> {
    tracing::info!("=== histogram demo ===");
    let span = traces.start_span("histogram_demo");

    let durations = metrics.create_histogram(
        "demo_operation_duration_seconds",
        "Duration of demo operations",
        "s",
    )?;

    let mut recorded = Measurements {
        spans_opened: 1,
        ..Measurements::default()
    };
    for i in 0..15 {
        let (operation, mean, spread) = OPERATIONS[i % OPERATIONS.len()];
        let duration_s = {
            let mut rng = rand::thread_rng();
            (mean + rng.gen_range(-2.0..=2.0) * spread).max(0.01)
        };
        durations.record(duration_s, &[KeyValue::new("operation", operation)]);
        recorded.histogram_records += 1;
        tracing::info!(operation, duration_s, "recorded operation duration");
        sleep(pace).await;
    }

    span.set_attribute(KeyValue::new("operations_completed", 15_i64));
    Ok(recorded)
}

/// Gauge scenario: 10 random-walk updates of two environmental sensors.
pub async fn gauge_demo(
    metrics: &Metrics,
    traces: &Tracing,
    pace: Duration,
) -> Result<Measurements, DemoError> {
    tracing::info!("=== gauge demo ===");
    let span = traces.start_span("gauge_demo");

    let temperature =
        metrics.create_gauge("demo_temperature_celsius", "Current temperature", "°C")?;
    let pressure = metrics.create_gauge(
        "demo_pressure_hpa",
        "Current atmospheric pressure",
        "hPa",
    )?;

    let mut temperature_c = 20.0_f64;
    let mut pressure_hpa = 1013.25_f64;
    let location = [KeyValue::new("location", "sensor_1")];

    let mut recorded = Measurements {
        spans_opened: 1,
        ..Measurements::default()
    };
    for _ in 0..10 {
        {
            let mut rng = rand::thread_rng();
            temperature_c += rng.gen_range(-2.0..=2.0);
            pressure_hpa += rng.gen_range(-5.0..=5.0);
        }
        temperature.record(temperature_c, &location);
        pressure.record(pressure_hpa, &location);
        recorded.gauge_updates += 2;
        tracing::info!(temperature_c, pressure_hpa, "updated gauges");
        sleep(pace).await;
    }

    span.set_attribute(KeyValue::new("gauge_updates", 10_i64));
    Ok(recorded)
}

/// Up-down counter scenario: 15 allocations and deallocations of a pool.
pub async fn updown_demo(
    metrics: &Metrics,
    traces: &Tracing,
    pace: Duration,
) -> Result<Measurements, DemoError> {
    tracing::info!("=== up-down counter demo ===");
    let span = traces.start_span("updown_counter_demo");

    let pool = metrics.create_up_down_counter(
        "demo_resource_pool",
        "Available resources in pool",
        "1",
    )?;

    let mut recorded = Measurements {
        spans_opened: 1,
        ..Measurements::default()
    };
    for _ in 0..15 {
        // 60% allocate, 40% deallocate
        let change: i32 = {
            let mut rng = rand::thread_rng();
            if rng.gen_bool(0.6) {
                rng.gen_range(1..=5)
            } else {
                -rng.gen_range(1..=3)
            }
        };
        pool.add(
            f64::from(change),
            &[KeyValue::new("resource_type", "compute_units")],
        );
        recorded.updown_changes += 1;

        let action = if change >= 0 { "allocated" } else { "deallocated" };
        tracing::info!(action, units = change.abs(), "resource pool change");
        sleep(pace).await;
    }

    span.set_attribute(KeyValue::new("resource_operations", 15_i64));
    Ok(recorded)
}

/// Comprehensive scenario: web-server and system workloads side by side.
///
/// The web-server simulation runs as a spawned task while the system
/// simulation runs inline, mirroring a service emitting request metrics
/// concurrently with resource metrics.
pub async fn comprehensive_demo(
    metrics: &Metrics,
    traces: &Tracing,
    pace: Duration,
) -> Result<Measurements, DemoError> {
    tracing::info!("=== comprehensive demo ===");
    let span = traces.start_span("comprehensive_demo");

    let workload = Workload::new(metrics)?;

    let web_server = tokio::spawn({
        let workload = workload.clone();
        async move { workload.simulate_web_server(20, pace).await }
    });

    let mut recorded = Measurements {
        spans_opened: 1,
        ..Measurements::default()
    };
    recorded.merge(workload.simulate_system(12, pace).await);
    recorded.merge(web_server.await??);

    span.set_attribute(KeyValue::new("demo_type", "comprehensive"));
    Ok(recorded)
}

/// Every scenario in order, with a pause between them.
pub async fn all_demos(
    metrics: &Metrics,
    traces: &Tracing,
    pace: Duration,
) -> Result<Measurements, DemoError> {
    let mut recorded = Measurements::default();

    recorded.merge(counter_demo(metrics, traces, pace).await?);
    sleep(pace * 4).await;
    recorded.merge(histogram_demo(metrics, traces, pace).await?);
    sleep(pace * 4).await;
    recorded.merge(gauge_demo(metrics, traces, pace).await?);
    sleep(pace * 4).await;
    recorded.merge(updown_demo(metrics, traces, pace).await?);
    sleep(pace * 4).await;
    recorded.merge(comprehensive_demo(metrics, traces, pace).await?);

    Ok(recorded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::tracing::init_test_tracing;

    fn facades() -> (Metrics, Tracing) {
        init_test_tracing();
        (Metrics::without_export(), Tracing::without_export())
    }

    #[tokio::test]
    async fn test_counter_demo_counts() {
        let (metrics, traces) = facades();
        let recorded = counter_demo(&metrics, &traces, Duration::ZERO).await.unwrap();
        assert_eq!(recorded.counter_adds, 20);
        assert_eq!(recorded.spans_opened, 1);
    }

    #[tokio::test]
    async fn test_histogram_demo_counts() {
        let (metrics, traces) = facades();
        let recorded = histogram_demo(&metrics, &traces, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(recorded.histogram_records, 15);
        assert_eq!(recorded.counter_adds, 0);
    }

    #[tokio::test]
    async fn test_gauge_demo_counts() {
        let (metrics, traces) = facades();
        let recorded = gauge_demo(&metrics, &traces, Duration::ZERO).await.unwrap();
        // Two gauges per iteration
        assert_eq!(recorded.gauge_updates, 20);
    }

    #[tokio::test]
    async fn test_updown_demo_counts() {
        let (metrics, traces) = facades();
        let recorded = updown_demo(&metrics, &traces, Duration::ZERO).await.unwrap();
        assert_eq!(recorded.updown_changes, 15);
    }

    #[tokio::test]
    async fn test_comprehensive_demo_runs_both_workloads() {
        let (metrics, traces) = facades();
        let recorded = comprehensive_demo(&metrics, &traces, Duration::ZERO)
            .await
            .unwrap();
        // 20 requests plus any error increments
        assert!(recorded.counter_adds >= 20);
        assert_eq!(recorded.histogram_records, 20);
        assert_eq!(recorded.gauge_updates, 24);
        assert_eq!(recorded.updown_changes, 24);
    }
}
