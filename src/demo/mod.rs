//! Demo driver: scenario selection, execution, and run reports.
//!
//! A run moves idle → running(kind) → done: one scenario is selected from
//! the configuration, executed as a fixed sequence of facade calls, and
//! summarized in a [`DemoReport`]. There is no error recovery beyond
//! propagating failures to the caller.

pub mod scenarios;
pub mod workload;

use opentelemetry::trace::Status;
use opentelemetry::KeyValue;
use serde::Serialize;
use std::fmt;
use std::time::Instant;

use crate::config::Config;
use crate::error::DemoError;
use crate::observability::metrics::Metrics;
use crate::observability::tracing::Tracing;

/// The selectable demo scenarios.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DemoKind {
    Counter,
    Histogram,
    Gauge,
    UpDown,
    Comprehensive,
    /// Every scenario above, in order.
    All,
}

impl DemoKind {
    /// Stable name used on the CLI, in span attributes, and in reports.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Counter => "counter",
            Self::Histogram => "histogram",
            Self::Gauge => "gauge",
            Self::UpDown => "updown",
            Self::Comprehensive => "comprehensive",
            Self::All => "all",
        }
    }
}

impl fmt::Display for DemoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DemoKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "counter" => Ok(Self::Counter),
            "histogram" => Ok(Self::Histogram),
            "gauge" => Ok(Self::Gauge),
            "updown" => Ok(Self::UpDown),
            "comprehensive" => Ok(Self::Comprehensive),
            "all" => Ok(Self::All),
            _ => Err(format!("unknown demo type: {}", s)),
        }
    }
}

/// Counts of measurements recorded during a run, by instrument kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Measurements {
    pub counter_adds: u64,
    pub histogram_records: u64,
    pub gauge_updates: u64,
    pub updown_changes: u64,
    pub spans_opened: u64,
}

impl Measurements {
    /// Fold another set of counts into this one.
    pub fn merge(&mut self, other: Measurements) {
        self.counter_adds += other.counter_adds;
        self.histogram_records += other.histogram_records;
        self.gauge_updates += other.gauge_updates;
        self.updown_changes += other.updown_changes;
        self.spans_opened += other.spans_opened;
    }
}

/// Summary of a completed demo run.
#[derive(Debug, Serialize)]
pub struct DemoReport {
    pub demo: String,
    pub run_id: String,
    pub elapsed_ms: u64,
    pub measurements: Measurements,
}

impl DemoReport {
    /// Human-readable rendering for text output.
    pub fn render_text(&self) -> String {
        let m = &self.measurements;
        [
            "Demo run complete".to_string(),
            format!("  demo:              {}", self.demo),
            format!("  run id:            {}", self.run_id),
            format!("  elapsed:           {} ms", self.elapsed_ms),
            format!("  counter adds:      {}", m.counter_adds),
            format!("  histogram records: {}", m.histogram_records),
            format!("  gauge updates:     {}", m.gauge_updates),
            format!("  updown changes:    {}", m.updown_changes),
            format!("  spans opened:      {}", m.spans_opened),
        ]
        .join("\n")
    }
}

/// Run the configured demo scenario to completion.
///
/// Wraps the whole run in a root span tagged with the demo kind and a
/// fresh run ID. A failed scenario marks the root span with error status
/// before the failure propagates.
pub async fn run(
    config: &Config,
    metrics: &Metrics,
    traces: &Tracing,
) -> Result<DemoReport, DemoError> {
    let run_id = crate::generate_run_id();
    let kind = config.demo_type;
    let pace = config.step_delay();
    let started = Instant::now();

    tracing::info!(demo = %kind, run_id = %run_id, "starting demo run");

    let root = traces.start_span("demo_run");
    root.set_attribute(KeyValue::new("demo.type", kind.as_str()));
    root.set_attribute(KeyValue::new("run.id", run_id.clone()));

    let mut measurements = Measurements {
        spans_opened: 1,
        ..Measurements::default()
    };

    let outcome = match kind {
        DemoKind::Counter => scenarios::counter_demo(metrics, traces, pace).await,
        DemoKind::Histogram => scenarios::histogram_demo(metrics, traces, pace).await,
        DemoKind::Gauge => scenarios::gauge_demo(metrics, traces, pace).await,
        DemoKind::UpDown => scenarios::updown_demo(metrics, traces, pace).await,
        DemoKind::Comprehensive => scenarios::comprehensive_demo(metrics, traces, pace).await,
        DemoKind::All => scenarios::all_demos(metrics, traces, pace).await,
    };

    match outcome {
        Ok(recorded) => {
            measurements.merge(recorded);
            root.set_status(Status::Ok);
        }
        Err(e) => {
            root.record_error(&e);
            return Err(e);
        }
    }

    tracing::info!(demo = %kind, "demo run complete");

    Ok(DemoReport {
        demo: kind.as_str().to_string(),
        run_id,
        elapsed_ms: started.elapsed().as_millis() as u64,
        measurements,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::tracing::init_test_tracing;

    fn test_setup(kind: DemoKind) -> (Config, Metrics, Tracing) {
        init_test_tracing();
        let mut config = Config::test_config();
        config.demo_type = kind;
        (config, Metrics::without_export(), Tracing::without_export())
    }

    #[tokio::test]
    async fn test_counter_demo_records_only_counters() {
        let (config, metrics, traces) = test_setup(DemoKind::Counter);
        let report = run(&config, &metrics, &traces).await.unwrap();

        assert_eq!(report.demo, "counter");
        assert_eq!(report.measurements.counter_adds, 20);
        assert_eq!(report.measurements.histogram_records, 0);
        assert_eq!(report.measurements.gauge_updates, 0);
        assert_eq!(report.measurements.updown_changes, 0);
    }

    #[tokio::test]
    async fn test_comprehensive_demo_exercises_all_kinds() {
        let (config, metrics, traces) = test_setup(DemoKind::Comprehensive);
        let report = run(&config, &metrics, &traces).await.unwrap();

        assert!(report.measurements.counter_adds > 0);
        assert!(report.measurements.histogram_records > 0);
        assert!(report.measurements.gauge_updates > 0);
        assert!(report.measurements.updown_changes > 0);
    }

    #[tokio::test]
    async fn test_all_runs_every_scenario() {
        let (config, metrics, traces) = test_setup(DemoKind::All);
        let report = run(&config, &metrics, &traces).await.unwrap();

        // Dedicated scenarios plus the comprehensive workload
        assert!(report.measurements.counter_adds >= 20);
        assert!(report.measurements.histogram_records >= 15);
        assert!(report.measurements.gauge_updates >= 20);
        assert!(report.measurements.updown_changes >= 15);
        // Root span plus one per scenario
        assert_eq!(report.measurements.spans_opened, 6);
    }

    #[test]
    fn test_demo_kind_round_trip() {
        for kind in [
            DemoKind::Counter,
            DemoKind::Histogram,
            DemoKind::Gauge,
            DemoKind::UpDown,
            DemoKind::Comprehensive,
            DemoKind::All,
        ] {
            assert_eq!(kind.as_str().parse::<DemoKind>().unwrap(), kind);
        }
        assert!("nope".parse::<DemoKind>().is_err());
    }

    #[test]
    fn test_report_serializes_to_json() {
        let report = DemoReport {
            demo: "counter".into(),
            run_id: "0192f0c1-0000-7000-8000-000000000000".into(),
            elapsed_ms: 12,
            measurements: Measurements {
                counter_adds: 20,
                spans_opened: 2,
                ..Measurements::default()
            },
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"demo\":\"counter\""));
        assert!(json.contains("\"counter_adds\":20"));
    }
}
