//! Workload simulators backing the comprehensive demo.
//!
//! A [`Workload`] owns a fixed set of application-style instruments
//! (request and error counters, latency histograms, resource gauges,
//! connection and queue up-down counters) and drives them the way a real
//! service would.

use opentelemetry::KeyValue;
use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;

use super::Measurements;
use crate::error::MetricError;
use crate::observability::metrics::{
    CounterHandle, GaugeHandle, HistogramHandle, Metrics, UpDownCounterHandle,
};

const METHODS: [&str; 4] = ["GET", "POST", "PUT", "DELETE"];
const STATUSES: [&str; 3] = ["200", "404", "500"];
const ENDPOINTS: [&str; 3] = ["/api/users", "/api/orders", "/api/products"];

/// Pre-registered instruments for the simulated service.
#[derive(Clone)]
pub struct Workload {
    request_counter: CounterHandle,
    error_counter: CounterHandle,
    request_duration: HistogramHandle,
    memory_usage: GaugeHandle,
    cpu_usage: GaugeHandle,
    active_connections: UpDownCounterHandle,
    queue_size: UpDownCounterHandle,
}

impl Workload {
    /// Register the full instrument set against the metrics facade.
    pub fn new(metrics: &Metrics) -> Result<Self, MetricError> {
        Ok(Self {
            request_counter: metrics.create_counter(
                "http_requests_total",
                "Total number of HTTP requests",
                "1",
            )?,
            error_counter: metrics.create_counter("errors_total", "Total number of errors", "1")?,
            request_duration: metrics.create_histogram(
                "http_request_duration_seconds",
                "Duration of HTTP requests",
                "s",
            )?,
            memory_usage: metrics.create_gauge(
                "memory_usage_bytes",
                "Current memory usage",
                "By",
            )?,
            cpu_usage: metrics.create_gauge(
                "cpu_usage_percent",
                "Current CPU usage percentage",
                "%",
            )?,
            active_connections: metrics.create_up_down_counter(
                "active_connections",
                "Number of active connections",
                "1",
            )?,
            queue_size: metrics.create_up_down_counter(
                "queue_size",
                "Number of items in processing queue",
                "1",
            )?,
        })
    }

    /// Simulate web-server traffic: one request per iteration with random
    /// method/status/endpoint attributes and a ~10% error rate.
    pub async fn simulate_web_server(
        &self,
        requests: usize,
        pace: Duration,
    ) -> Result<Measurements, MetricError> {
        tracing::info!(requests, "simulating web server traffic");

        let mut recorded = Measurements::default();
        for i in 0..requests {
            let (method, status, endpoint, duration_s, failed) = {
                let mut rng = rand::thread_rng();
                (
                    METHODS[rng.gen_range(0..METHODS.len())],
                    STATUSES[rng.gen_range(0..STATUSES.len())],
                    ENDPOINTS[rng.gen_range(0..ENDPOINTS.len())],
                    rng.gen_range(0.1..=2.0),
                    rng.gen_bool(0.1),
                )
            };

            let attrs = [
                KeyValue::new("method", method),
                KeyValue::new("status", status),
                KeyValue::new("endpoint", endpoint),
            ];
            self.request_counter.add(1.0, &attrs)?;
            self.request_duration.record(duration_s, &attrs);
            recorded.counter_adds += 1;
            recorded.histogram_records += 1;

            if failed {
                self.error_counter.add(
                    1.0,
                    &[
                        KeyValue::new("error_type", "timeout"),
                        KeyValue::new("service", "database"),
                    ],
                )?;
                recorded.counter_adds += 1;
            }

            tracing::info!(request = i + 1, requests, duration_s, "processed request");
            sleep(pace).await;
        }
        Ok(recorded)
    }

    /// Simulate system resources: memory and CPU gauges plus connection
    /// and queue churn, updated at half the web-server rate.
    pub async fn simulate_system(&self, updates: usize, pace: Duration) -> Measurements {
        tracing::info!(updates, "simulating system resource metrics");

        let mut recorded = Measurements::default();
        for _ in 0..updates {
            let (memory_bytes, cpu_percent, connection_delta, queue_delta) = {
                let mut rng = rand::thread_rng();
                (
                    rng.gen_range(1_000_000_000.0..=4_000_000_000.0),
                    rng.gen_range(10.0..=90.0),
                    rng.gen_range(-2..=3),
                    rng.gen_range(-3..=4),
                )
            };

            self.memory_usage.record(memory_bytes, &[]);
            self.cpu_usage.record(cpu_percent, &[]);
            self.active_connections
                .add(f64::from(connection_delta), &[]);
            self.queue_size.add(f64::from(queue_delta), &[]);
            recorded.gauge_updates += 2;
            recorded.updown_changes += 2;

            tracing::debug!(memory_bytes, cpu_percent, "updated system metrics");
            sleep(pace * 2).await;
        }

        tracing::info!("system metrics simulation complete");
        recorded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_web_server_simulation_counts() {
        let metrics = Metrics::without_export();
        let workload = Workload::new(&metrics).unwrap();

        let recorded = workload
            .simulate_web_server(5, Duration::ZERO)
            .await
            .unwrap();
        assert!(recorded.counter_adds >= 5);
        assert_eq!(recorded.histogram_records, 5);
        assert_eq!(recorded.gauge_updates, 0);
    }

    #[tokio::test]
    async fn test_system_simulation_counts() {
        let metrics = Metrics::without_export();
        let workload = Workload::new(&metrics).unwrap();

        let recorded = workload.simulate_system(3, Duration::ZERO).await;
        assert_eq!(recorded.gauge_updates, 6);
        assert_eq!(recorded.updown_changes, 6);
        assert_eq!(recorded.counter_adds, 0);
    }

    #[test]
    fn test_workload_reuses_registered_instruments() {
        let metrics = Metrics::without_export();
        let first = Workload::new(&metrics).unwrap();
        let count = metrics.registry().instrument_count();

        // A second workload picks up the cached handles
        let _second = Workload::new(&metrics).unwrap();
        assert_eq!(metrics.registry().instrument_count(), count);
        drop(first);
    }
}
