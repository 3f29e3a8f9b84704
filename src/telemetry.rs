//! Logging and distributed tracing setup
//!
//! Logs go through `tracing-subscriber` with an `EnvFilter` defaulting to
//! `info`. An OTLP exporter is added only when `OTEL_EXPORTER_OTLP_ENDPOINT`
//! is set. In MCP mode stdout carries the protocol, so logs go to stderr.

use opentelemetry::KeyValue;
use opentelemetry_sdk::trace::{self as sdktrace, Tracer};
use opentelemetry_sdk::{runtime, Resource};
use tracing::{info, Level};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::{Error, Result};

pub const SERVICE_NAME: &str = "argo-deployer";

/// Where human-readable logs are written
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogTarget {
    Stdout,
    Stderr,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// `json` (any case) selects JSON lines; anything else is plain text
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

fn make_writer(target: LogTarget) -> BoxMakeWriter {
    match target {
        LogTarget::Stdout => BoxMakeWriter::new(std::io::stdout),
        LogTarget::Stderr => BoxMakeWriter::new(std::io::stderr),
    }
}

fn init_tracer() -> Result<Tracer> {
    opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(opentelemetry_otlp::new_exporter().tonic())
        .with_trace_config(
            sdktrace::config().with_resource(Resource::new(vec![KeyValue::new(
                "service.name",
                SERVICE_NAME,
            )])),
        )
        .install_batch(runtime::Tokio)
        .map_err(|e| Error::ConfigError(format!("failed to install OTLP pipeline: {e}")))
}

/// Install the global subscriber; returns whether OpenTelemetry is enabled
pub fn init_tracing(target: LogTarget) -> Result<bool> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();

    let format = LogFormat::from_env_value(std::env::var("LOG_FORMAT").ok().as_deref());
    let text_layer = (format == LogFormat::Text)
        .then(|| fmt::layer().with_target(true).with_writer(make_writer(target)));
    let json_layer =
        (format == LogFormat::Json).then(|| fmt::layer().json().with_writer(make_writer(target)));

    let otel_enabled = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok();
    let otel_layer = if otel_enabled {
        Some(tracing_opentelemetry::layer().with_tracer(init_tracer()?))
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(text_layer)
        .with(json_layer)
        .with(otel_layer)
        .try_init()
        .map_err(|e| Error::ConfigError(format!("failed to install tracing subscriber: {e}")))?;

    if otel_enabled {
        info!("OpenTelemetry tracing initialized");
    } else {
        info!("OpenTelemetry tracing disabled (OTEL_EXPORTER_OTLP_ENDPOINT not set)");
    }
    Ok(otel_enabled)
}

/// Flush pending spans to the collector
pub fn shutdown_telemetry() {
    opentelemetry::global::shutdown_tracer_provider();
}
