// SPDX-License-Identifier: MIT
//! Telemetry configuration: resource identity, exporter selection, export
//! cadence and the instrumentation set.
//!
//! A [`TelemetryConfig`] is either built in code (starting from
//! [`TelemetryConfig::default`]) or read from the process environment with
//! [`TelemetryConfig::from_env`]. The recognized variables follow the
//! OpenTelemetry naming conventions:
//!
//! * `OTEL_SERVICE_NAME` – `service.name` resource attribute.
//! * `OTEL_RESOURCE_ATTRIBUTES` – extra resource attributes, `k=v,k2=v2`.
//! * `RUST_ENV` – deployment environment (added as `deployment.environment`).
//! * `OTEL_TRACES_EXPORTER` / `OTEL_METRICS_EXPORTER` – exporter kinds.
//! * `OTEL_METRIC_EXPORT_INTERVAL` / `OTEL_METRIC_EXPORT_TIMEOUT` – milliseconds.
//! * `OTEL_EXPORTER_OTLP_ENDPOINT` – collector endpoint.
//! * `OTEL_RUST_ENABLED_INSTRUMENTATIONS` – comma separated instrumentation ids.
//! * `RUST_LOG` – `EnvFilter` directives for the installed subscriber.
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Result, TelemetryError};
use crate::instrumentation::AUTO;

/// Transport used to emit trace data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TraceExporterKind {
    OtlpGrpc,
    OtlpHttp,
    Console,
    None,
}

/// Transport used to emit metric data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MetricExporterKind {
    OtlpGrpc,
    OtlpHttp,
    Console,
    None,
}

/// Kind names are case-insensitive; `otlp` is accepted as `otlp-grpc`.
fn normalize_kind(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

impl FromStr for TraceExporterKind {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_kind(s).as_str() {
            "otlp" | "otlp-grpc" => Ok(Self::OtlpGrpc),
            "otlp-http" => Ok(Self::OtlpHttp),
            "console" => Ok(Self::Console),
            "none" => Ok(Self::None),
            _ => Err(TelemetryError::invalid(format!(
                "unrecognized trace exporter `{s}`"
            ))),
        }
    }
}

impl FromStr for MetricExporterKind {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_kind(s).as_str() {
            "otlp" | "otlp-grpc" => Ok(Self::OtlpGrpc),
            "otlp-http" => Ok(Self::OtlpHttp),
            "console" => Ok(Self::Console),
            "none" => Ok(Self::None),
            _ => Err(TelemetryError::invalid(format!(
                "unrecognized metric exporter `{s}`"
            ))),
        }
    }
}

impl fmt::Display for TraceExporterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::OtlpGrpc => "otlp-grpc",
            Self::OtlpHttp => "otlp-http",
            Self::Console => "console",
            Self::None => "none",
        })
    }
}

impl fmt::Display for MetricExporterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::OtlpGrpc => "otlp-grpc",
            Self::OtlpHttp => "otlp-http",
            Self::Console => "console",
            Self::None => "none",
        })
    }
}

/// Configuration consumed by [`crate::telemetry::initialize`].
///
/// All fields are owned so the config can be built once at startup and moved
/// into the bootstrap. It is never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name reported in resource attributes (`service.name`).
    pub service_name: String,
    /// Additional resource attributes attached to every span and metric.
    pub resource_attributes: BTreeMap<String, String>,
    pub trace_exporter: TraceExporterKind,
    pub metric_exporter: MetricExporterKind,
    /// How often metrics are collected and exported. Must be positive.
    pub metric_export_interval_millis: u64,
    /// Upper bound on a single export cycle. Must be positive.
    pub export_timeout_millis: u64,
    /// How long shutdown waits for in-flight exports before giving up.
    pub shutdown_grace_millis: u64,
    /// Collector endpoint. When unset, each OTLP exporter falls back to its
    /// own default (and to `OTEL_EXPORTER_OTLP_*` variables).
    pub otlp_endpoint: Option<String>,
    /// Instrumentation identifiers; see [`crate::instrumentation`].
    pub instrumentations: BTreeSet<String>,
    /// `EnvFilter` directives for the installed subscriber.
    pub log_filter: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: env!("CARGO_PKG_NAME").to_string(),
            resource_attributes: BTreeMap::new(),
            trace_exporter: TraceExporterKind::OtlpGrpc,
            metric_exporter: MetricExporterKind::Console,
            metric_export_interval_millis: 60_000,
            export_timeout_millis: 30_000,
            shutdown_grace_millis: 5_000,
            otlp_endpoint: None,
            instrumentations: BTreeSet::from([AUTO.to_string()]),
            log_filter: "info".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    ///
    /// Absent variables keep their [`Default`] value. Present but malformed
    /// values fail with [`TelemetryError::InvalidConfig`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(name) = get("OTEL_SERVICE_NAME") {
            cfg.service_name = name;
        }
        if let Some(raw) = get("OTEL_RESOURCE_ATTRIBUTES") {
            cfg.resource_attributes = parse_attributes(&raw)?;
        }
        cfg.resource_attributes
            .entry("deployment.environment".to_string())
            .or_insert_with(|| get("RUST_ENV").unwrap_or_else(|| "dev".into()));

        if let Some(raw) = get("OTEL_TRACES_EXPORTER") {
            cfg.trace_exporter = raw.parse()?;
        }
        if let Some(raw) = get("OTEL_METRICS_EXPORTER") {
            cfg.metric_exporter = raw.parse()?;
        }
        if let Some(raw) = get("OTEL_METRIC_EXPORT_INTERVAL") {
            cfg.metric_export_interval_millis = parse_millis("OTEL_METRIC_EXPORT_INTERVAL", &raw)?;
        }
        if let Some(raw) = get("OTEL_METRIC_EXPORT_TIMEOUT") {
            cfg.export_timeout_millis = parse_millis("OTEL_METRIC_EXPORT_TIMEOUT", &raw)?;
        }
        cfg.otlp_endpoint = get("OTEL_EXPORTER_OTLP_ENDPOINT");
        if let Some(raw) = get("OTEL_RUST_ENABLED_INSTRUMENTATIONS") {
            cfg.instrumentations = raw
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(filter) = get("RUST_LOG") {
            cfg.log_filter = filter;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    /// Check the invariants that the type system does not enforce.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("metric_export_interval_millis", self.metric_export_interval_millis),
            ("export_timeout_millis", self.export_timeout_millis),
            ("shutdown_grace_millis", self.shutdown_grace_millis),
        ] {
            if value == 0 {
                return Err(TelemetryError::invalid(format!("{field} must be positive")));
            }
        }
        if let Some(key) = self.resource_attributes.keys().find(|k| k.trim().is_empty()) {
            return Err(TelemetryError::invalid(format!(
                "resource attribute key `{key}` is empty"
            )));
        }
        if let Some(endpoint) = &self.otlp_endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(TelemetryError::invalid(format!(
                    "otlp endpoint `{endpoint}` must start with http:// or https://"
                )));
            }
        }
        Ok(())
    }

    pub fn metric_export_interval(&self) -> Duration {
        Duration::from_millis(self.metric_export_interval_millis)
    }

    pub fn export_timeout(&self) -> Duration {
        Duration::from_millis(self.export_timeout_millis)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_millis)
    }
}

fn parse_millis(var: &str, raw: &str) -> Result<u64> {
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => Err(TelemetryError::invalid(format!(
            "{var} must be a positive number of milliseconds, got `{raw}`"
        ))),
        Ok(ms) => Ok(ms),
    }
}

fn parse_attributes(raw: &str) -> Result<BTreeMap<String, String>> {
    let mut attrs = BTreeMap::new();
    for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            TelemetryError::invalid(format!("resource attribute `{pair}` is not key=value"))
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(TelemetryError::invalid(format!(
                "resource attribute `{pair}` has an empty key"
            )));
        }
        if attrs.insert(key.to_string(), value.trim().to_string()).is_some() {
            return Err(TelemetryError::invalid(format!(
                "duplicate resource attribute `{key}`"
            )));
        }
    }
    Ok(attrs)
}
