//! Configuration parsing for the Beacon demo.
//!
//! Supports:
//! - CLI arguments via clap
//! - Environment variable overrides
//! - Sensible defaults for quick start against a local collector
//!
//! The configuration is parsed once at startup, validated fail-fast, and
//! read-only afterwards.

use clap::Parser;
use opentelemetry::KeyValue;
use opentelemetry_sdk::Resource;
use opentelemetry_semantic_conventions as semconv;
use std::time::Duration;

use crate::demo::DemoKind;
use crate::error::ConfigError;

/// Beacon: an OpenTelemetry instrumentation demo.
#[derive(Parser, Debug, Clone)]
#[command(name = "beacon")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Which demo scenario to run
    #[arg(long, env = "BEACON_DEMO_TYPE", default_value = "all")]
    pub demo_type: DemoKind,

    /// Service name reported in the telemetry resource
    #[arg(long, env = "BEACON_SERVICE_NAME", default_value = "beacon-demo")]
    pub service_name: String,

    /// Service version reported in the telemetry resource
    #[arg(long, env = "BEACON_SERVICE_VERSION", default_value = env!("CARGO_PKG_VERSION"))]
    pub service_version: String,

    /// Deployment environment reported in the telemetry resource
    #[arg(long, env = "BEACON_ENVIRONMENT", default_value = "development")]
    pub environment: String,

    /// OpenTelemetry collector endpoint for OTLP/gRPC export
    #[arg(
        long,
        env = "OTEL_EXPORTER_OTLP_ENDPOINT",
        default_value = "http://localhost:4317"
    )]
    pub otlp_endpoint: String,

    /// Extra resource attribute as key=value (repeatable)
    #[arg(long = "resource-attr", value_name = "KEY=VALUE")]
    pub resource_attrs: Vec<String>,

    /// Delay between demo iterations in milliseconds
    #[arg(long, env = "BEACON_STEP_DELAY_MS", default_value_t = 500)]
    pub step_delay_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Output format for the run report (text, json)
    #[arg(short, long, default_value = "text")]
    pub output: OutputFormat,
}

impl Config {
    /// Parse configuration from CLI arguments and environment.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed configuration.
    ///
    /// Checks presence of a service name, a syntactically valid http(s)
    /// endpoint, and well-formed `key=value` resource attributes. Nothing
    /// beyond that is validated here.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.trim().is_empty() {
            return Err(ConfigError::EmptyServiceName);
        }
        validate_endpoint(&self.otlp_endpoint)?;
        for attr in &self.resource_attrs {
            match attr.split_once('=') {
                Some((key, _)) if !key.trim().is_empty() => {}
                _ => return Err(ConfigError::InvalidResourceAttribute(attr.clone())),
            }
        }
        Ok(())
    }

    /// Build the OpenTelemetry resource describing this service.
    ///
    /// Carries `service.name`, `service.version`, and
    /// `deployment.environment`, plus any extra `--resource-attr` pairs.
    pub fn resource(&self) -> Resource {
        let mut attrs = vec![
            KeyValue::new(semconv::resource::SERVICE_NAME, self.service_name.clone()),
            KeyValue::new(
                semconv::resource::SERVICE_VERSION,
                self.service_version.clone(),
            ),
            KeyValue::new("deployment.environment", self.environment.clone()),
        ];
        for attr in &self.resource_attrs {
            if let Some((key, value)) = attr.split_once('=') {
                attrs.push(KeyValue::new(key.to_string(), value.to_string()));
            }
        }
        Resource::new(attrs)
    }

    /// Pacing delay between demo iterations.
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    /// Create a default configuration for testing (no pacing delays).
    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            demo_type: DemoKind::All,
            service_name: "beacon-test".into(),
            service_version: "0.0.0".into(),
            environment: "test".into(),
            otlp_endpoint: "http://localhost:4317".into(),
            resource_attrs: Vec::new(),
            step_delay_ms: 0,
            log_level: "debug".into(),
            output: OutputFormat::Text,
        }
    }
}

/// Check that an endpoint is a syntactically plausible http(s) URI.
fn validate_endpoint(endpoint: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason: reason.to_string(),
    };

    let authority = endpoint
        .strip_prefix("http://")
        .or_else(|| endpoint.strip_prefix("https://"))
        .ok_or_else(|| invalid("scheme must be http or https"))?;

    if authority.is_empty() {
        return Err(invalid("missing host"));
    }
    if authority.chars().any(char::is_whitespace) {
        return Err(invalid("whitespace not allowed"));
    }
    Ok(())
}

/// Output format for the run report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("unknown output format: {}", s)),
        }
    }
}
