//! OTLP metrics facade.
//!
//! Instrument handles are created lazily and cached by name, so repeated
//! registration of the same instrument returns the same handle. Measurement
//! delivery (aggregation, batching, export cadence) is owned entirely by the
//! OpenTelemetry SDK; this layer only forwards values.

use opentelemetry::metrics::{Counter, Gauge, Histogram, Meter, MeterProvider as _, UpDownCounter};
use opentelemetry::{global, KeyValue};
use opentelemetry_sdk::metrics::{ManualReader, SdkMeterProvider};
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

use crate::config::Config;
use crate::error::MetricError;

/// Instrument scope name reported to the SDK.
const METER_NAME: &str = "beacon";

/// Export interval for the periodic OTLP reader.
const EXPORT_PERIOD: Duration = Duration::from_secs(5);

/// The four instrument kinds supported by the facade.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstrumentKind {
    Counter,
    Histogram,
    Gauge,
    UpDownCounter,
}

impl fmt::Display for InstrumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Counter => "counter",
            Self::Histogram => "histogram",
            Self::Gauge => "gauge",
            Self::UpDownCounter => "up_down_counter",
        };
        f.write_str(name)
    }
}

/// Handle to a monotonically increasing counter.
#[derive(Clone, Debug)]
pub struct CounterHandle {
    name: String,
    inner: Counter<f64>,
}

impl CounterHandle {
    /// Add to the counter.
    ///
    /// Negative values are rejected here rather than forwarded; a counter
    /// only moves up.
    pub fn add(&self, value: f64, attributes: &[KeyValue]) -> Result<(), MetricError> {
        if value < 0.0 {
            return Err(MetricError::NegativeIncrement {
                name: self.name.clone(),
                value,
            });
        }
        self.inner.add(value, attributes);
        Ok(())
    }
}

/// Handle to a histogram recording a distribution of values.
#[derive(Clone, Debug)]
pub struct HistogramHandle {
    inner: Histogram<f64>,
}

impl HistogramHandle {
    /// Record an observed value.
    pub fn record(&self, value: f64, attributes: &[KeyValue]) {
        self.inner.record(value, attributes);
    }
}

/// Handle to a gauge reporting a current value.
#[derive(Clone, Debug)]
pub struct GaugeHandle {
    inner: Gauge<f64>,
}

impl GaugeHandle {
    /// Set the current value.
    pub fn record(&self, value: f64, attributes: &[KeyValue]) {
        self.inner.record(value, attributes);
    }
}

/// Handle to an up-down counter tracking a bidirectional cumulative value.
#[derive(Clone, Debug)]
pub struct UpDownCounterHandle {
    inner: UpDownCounter<f64>,
}

impl UpDownCounterHandle {
    /// Apply a delta, positive or negative.
    pub fn add(&self, value: f64, attributes: &[KeyValue]) {
        self.inner.add(value, attributes);
    }
}

#[derive(Clone, Debug)]
enum CachedInstrument {
    Counter(CounterHandle),
    Histogram(HistogramHandle),
    Gauge(GaugeHandle),
    UpDownCounter(UpDownCounterHandle),
}

impl CachedInstrument {
    fn kind(&self) -> InstrumentKind {
        match self {
            Self::Counter(_) => InstrumentKind::Counter,
            Self::Histogram(_) => InstrumentKind::Histogram,
            Self::Gauge(_) => InstrumentKind::Gauge,
            Self::UpDownCounter(_) => InstrumentKind::UpDownCounter,
        }
    }
}

/// Registry of named instruments.
///
/// Creation is idempotent per (name, kind): asking for an existing
/// instrument returns the cached handle. Asking for an existing name under
/// a different kind is an error, since instrument names are unique within
/// the process.
pub struct MetricsRegistry {
    meter: Meter,
    instruments: Mutex<HashMap<String, CachedInstrument>>,
}

impl MetricsRegistry {
    /// Create an empty registry backed by the given meter.
    pub fn new(meter: Meter) -> Self {
        Self {
            meter,
            instruments: Mutex::new(HashMap::new()),
        }
    }

    /// Create (or fetch the cached) counter.
    pub fn create_counter(
        &self,
        name: &str,
        description: &str,
        unit: &str,
    ) -> Result<CounterHandle, MetricError> {
        let mut instruments = self.instruments.lock().unwrap();
        if let Some(existing) = instruments.get(name) {
            return match existing {
                CachedInstrument::Counter(handle) => Ok(handle.clone()),
                other => Err(mismatch(name, other.kind(), InstrumentKind::Counter)),
            };
        }

        let counter = self
            .meter
            .f64_counter(name.to_string())
            .with_description(description.to_string())
            .with_unit(unit.to_string())
            .init();
        let handle = CounterHandle {
            name: name.to_string(),
            inner: counter,
        };
        instruments.insert(name.to_string(), CachedInstrument::Counter(handle.clone()));
        tracing::debug!(instrument = name, "registered counter");
        Ok(handle)
    }

    /// Create (or fetch the cached) histogram.
    pub fn create_histogram(
        &self,
        name: &str,
        description: &str,
        unit: &str,
    ) -> Result<HistogramHandle, MetricError> {
        let mut instruments = self.instruments.lock().unwrap();
        if let Some(existing) = instruments.get(name) {
            return match existing {
                CachedInstrument::Histogram(handle) => Ok(handle.clone()),
                other => Err(mismatch(name, other.kind(), InstrumentKind::Histogram)),
            };
        }

        let histogram = self
            .meter
            .f64_histogram(name.to_string())
            .with_description(description.to_string())
            .with_unit(unit.to_string())
            .init();
        let handle = HistogramHandle { inner: histogram };
        instruments.insert(
            name.to_string(),
            CachedInstrument::Histogram(handle.clone()),
        );
        tracing::debug!(instrument = name, "registered histogram");
        Ok(handle)
    }

    /// Create (or fetch the cached) gauge.
    pub fn create_gauge(
        &self,
        name: &str,
        description: &str,
        unit: &str,
    ) -> Result<GaugeHandle, MetricError> {
        let mut instruments = self.instruments.lock().unwrap();
        if let Some(existing) = instruments.get(name) {
            return match existing {
                CachedInstrument::Gauge(handle) => Ok(handle.clone()),
                other => Err(mismatch(name, other.kind(), InstrumentKind::Gauge)),
            };
        }

        let gauge = self
            .meter
            .f64_gauge(name.to_string())
            .with_description(description.to_string())
            .with_unit(unit.to_string())
            .init();
        let handle = GaugeHandle { inner: gauge };
        instruments.insert(name.to_string(), CachedInstrument::Gauge(handle.clone()));
        tracing::debug!(instrument = name, "registered gauge");
        Ok(handle)
    }

    /// Create (or fetch the cached) up-down counter.
    pub fn create_up_down_counter(
        &self,
        name: &str,
        description: &str,
        unit: &str,
    ) -> Result<UpDownCounterHandle, MetricError> {
        let mut instruments = self.instruments.lock().unwrap();
        if let Some(existing) = instruments.get(name) {
            return match existing {
                CachedInstrument::UpDownCounter(handle) => Ok(handle.clone()),
                other => Err(mismatch(name, other.kind(), InstrumentKind::UpDownCounter)),
            };
        }

        let updown = self
            .meter
            .f64_up_down_counter(name.to_string())
            .with_description(description.to_string())
            .with_unit(unit.to_string())
            .init();
        let handle = UpDownCounterHandle { inner: updown };
        instruments.insert(
            name.to_string(),
            CachedInstrument::UpDownCounter(handle.clone()),
        );
        tracing::debug!(instrument = name, "registered up-down counter");
        Ok(handle)
    }

    /// Number of registered instruments.
    #[cfg(test)]
    pub fn instrument_count(&self) -> usize {
        self.instruments.lock().unwrap().len()
    }
}

fn mismatch(name: &str, existing: InstrumentKind, requested: InstrumentKind) -> MetricError {
    MetricError::KindMismatch {
        name: name.to_string(),
        existing,
        requested,
    }
}

/// Metrics facade owning the meter provider and the instrument registry.
pub struct Metrics {
    provider: SdkMeterProvider,
    registry: MetricsRegistry,
}

impl Metrics {
    fn from_provider(provider: SdkMeterProvider) -> Self {
        let meter = provider.meter(METER_NAME);
        Self {
            provider,
            registry: MetricsRegistry::new(meter),
        }
    }

    /// Create a facade that records measurements without exporting them.
    ///
    /// Used by tests and offline runs; measurements go to a manual reader
    /// that is never read.
    pub fn without_export() -> Self {
        let reader = ManualReader::builder().build();
        let provider = SdkMeterProvider::builder().with_reader(reader).build();
        Self::from_provider(provider)
    }

    /// The instrument registry.
    pub fn registry(&self) -> &MetricsRegistry {
        &self.registry
    }

    /// Create (or fetch the cached) counter.
    pub fn create_counter(
        &self,
        name: &str,
        description: &str,
        unit: &str,
    ) -> Result<CounterHandle, MetricError> {
        self.registry.create_counter(name, description, unit)
    }

    /// Create (or fetch the cached) histogram.
    pub fn create_histogram(
        &self,
        name: &str,
        description: &str,
        unit: &str,
    ) -> Result<HistogramHandle, MetricError> {
        self.registry.create_histogram(name, description, unit)
    }

    /// Create (or fetch the cached) gauge.
    pub fn create_gauge(
        &self,
        name: &str,
        description: &str,
        unit: &str,
    ) -> Result<GaugeHandle, MetricError> {
        self.registry.create_gauge(name, description, unit)
    }

    /// Create (or fetch the cached) up-down counter.
    pub fn create_up_down_counter(
        &self,
        name: &str,
        description: &str,
        unit: &str,
    ) -> Result<UpDownCounterHandle, MetricError> {
        self.registry.create_up_down_counter(name, description, unit)
    }

    /// Flush and shut down the meter provider.
    ///
    /// Export failures are logged, not propagated; delivery reliability is
    /// the exporter's concern.
    pub fn shutdown(&self) {
        if let Err(e) = self.provider.shutdown() {
            tracing::warn!(error = %e, "metrics shutdown reported an error");
        } else {
            tracing::info!("metrics shutdown complete");
        }
    }
}

/// Initialize the metrics facade with OTLP export.
///
/// Installs a periodic OTLP/gRPC exporter against the configured endpoint
/// and registers the provider globally. If the exporter cannot be built,
/// falls back to a non-exporting provider so the demo still runs.
pub fn init_metrics(config: &Config) -> Metrics {
    use opentelemetry_otlp::{Protocol, WithExportConfig};

    let exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(config.otlp_endpoint.clone())
        .with_protocol(Protocol::Grpc);

    let provider = match opentelemetry_otlp::new_pipeline()
        .metrics(opentelemetry_sdk::runtime::Tokio)
        .with_exporter(exporter)
        .with_resource(config.resource())
        .with_period(EXPORT_PERIOD)
        .build()
    {
        Ok(provider) => {
            tracing::info!(endpoint = %config.otlp_endpoint, "OTLP metrics exporter configured");
            provider
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to create OTLP metrics exporter, recording without export");
            let reader = ManualReader::builder().build();
            SdkMeterProvider::builder().with_reader(reader).build()
        }
    };

    global::set_meter_provider(provider.clone());
    Metrics::from_provider(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_registration_is_idempotent() {
        let metrics = Metrics::without_export();
        let first = metrics
            .create_counter("requests_total", "Total requests", "1")
            .unwrap();
        let second = metrics
            .create_counter("requests_total", "Total requests", "1")
            .unwrap();

        // Same cached instrument, not a new registration
        assert_eq!(metrics.registry().instrument_count(), 1);
        first.add(1.0, &[]).unwrap();
        second.add(1.0, &[]).unwrap();
    }

    #[test]
    fn test_kind_mismatch_is_rejected() {
        let metrics = Metrics::without_export();
        metrics
            .create_counter("payload_size", "Payload size", "By")
            .unwrap();

        let err = metrics
            .create_histogram("payload_size", "Payload size", "By")
            .unwrap_err();
        assert!(matches!(
            err,
            MetricError::KindMismatch {
                existing: InstrumentKind::Counter,
                requested: InstrumentKind::Histogram,
                ..
            }
        ));
    }

    #[test]
    fn test_negative_counter_increment_is_rejected() {
        let metrics = Metrics::without_export();
        let counter = metrics
            .create_counter("events_total", "Total events", "1")
            .unwrap();

        let err = counter.add(-1.0, &[]).unwrap_err();
        assert!(matches!(err, MetricError::NegativeIncrement { .. }));

        // Zero and positive increments pass through
        counter.add(0.0, &[]).unwrap();
        counter.add(2.5, &[]).unwrap();
    }

    #[test]
    fn test_updown_counter_accepts_negative_deltas() {
        let metrics = Metrics::without_export();
        let updown = metrics
            .create_up_down_counter("active_sessions", "Active sessions", "1")
            .unwrap();

        updown.add(3.0, &[]);
        updown.add(-2.0, &[]);
    }

    #[test]
    fn test_each_kind_registers_once() {
        let metrics = Metrics::without_export();
        metrics.create_counter("a", "", "1").unwrap();
        metrics.create_histogram("b", "", "s").unwrap();
        metrics.create_gauge("c", "", "By").unwrap();
        metrics.create_up_down_counter("d", "", "1").unwrap();
        assert_eq!(metrics.registry().instrument_count(), 4);

        let gauge = metrics.create_gauge("c", "", "By").unwrap();
        gauge.record(42.0, &[KeyValue::new("location", "sensor_1")]);
        assert_eq!(metrics.registry().instrument_count(), 4);
    }
}
