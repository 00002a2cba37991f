//! Beacon: an OpenTelemetry instrumentation demo.
//!
//! # Usage
//!
//! ```bash
//! beacon --demo-type counter --otlp-endpoint http://localhost:4317
//! ```
//!
//! Environment variables can also be used:
//! - `BEACON_DEMO_TYPE`: Scenario to run
//! - `BEACON_SERVICE_NAME`: Service name for telemetry
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: Collector endpoint
//! - `RUST_LOG`: Log level (trace, debug, info, warn, error)

use anyhow::Result;
use beacon::config::{Config, OutputFormat};
use beacon::demo::{self, DemoReport};
use beacon::observability::metrics::init_metrics;
use beacon::observability::tracing::init_tracing;

/// Print startup banner with version and configuration.
fn print_banner(config: &Config) {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!(
        r#"
    ____
   | __ )  ___  __ _  ___ ___  _ __
   |  _ \ / _ \/ _` |/ __/ _ \| '_ \
   | |_) |  __/ (_| | (_| (_) | | | |
   |____/ \___|\__,_|\___\___/|_| |_|

  Beacon v{} - OpenTelemetry Instrumentation Demo

  Configuration:
    Service:    {}
    Endpoint:   {}
    Demo:       {}
    Log Level:  {}

  Press Ctrl+C to stop early.
"#,
        version,
        config.service_name,
        config.otlp_endpoint,
        config.demo_type,
        config.log_level
    );
}

fn print_report(report: &DemoReport, output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Text => println!("{}", report.render_text()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse configuration from CLI arguments and environment
    let config = Config::parse_args();

    // Fail fast on malformed configuration, before any pipeline exists
    config.validate()?;

    // Initialize tracing/logging and metrics export
    let traces = init_tracing(&config)?;
    let metrics = init_metrics(&config);

    // Print startup banner
    print_banner(&config);

    // Run the selected demo, cancelling cleanly on Ctrl+C
    let outcome = tokio::select! {
        result = demo::run(&config, &metrics, &traces) => result.map(Some),
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl+C, stopping demo early...");
            Ok(None)
        }
    };

    // Flush and shut down both pipelines before reporting the outcome
    metrics.shutdown();
    traces.shutdown();

    if let Some(report) = outcome? {
        print_report(&report, config.output)?;
    }

    tracing::info!("Beacon shutdown complete");
    Ok(())
}
