// SPDX-License-Identifier: MIT
//! Crate providing a one-shot telemetry bootstrap for Rust services.
//!
//! This library starts OpenTelemetry traces and metrics for a process exactly
//! once, before any other work is observed, and tears them down on exit:
//! * Traces exported over OTLP/gRPC, OTLP/HTTP or to the console.
//! * Metrics collected on a fixed interval by a background export task.
//! * Instrumentation (tracing bridge, console logs, propagator, panic hook)
//!   selected by identifier.
//!
//! The primary entry points are found in the [`telemetry`] module:
//! [`telemetry::initialize`], [`telemetry::shutdown`] /
//! [`telemetry::shutdown_async`] and
//! [`telemetry::SdkHandle`]. Configuration lives in [`config`].
//!
//! # Feature Flags
//! * `otlp-log` – enable an OTLP log exporter and bridge tracing events into
//!   logs (the `logs` instrumentation).
//!
//! # Quick Start
//! ```no_run
//! use otel_bootstrap::telemetry::initialize;
//! use otel_bootstrap::TelemetryConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let handle = initialize(TelemetryConfig::from_env()?)?;
//!     // business logic
//!     handle.shutdown_async().await;
//!     Ok(())
//! }
//! ```
pub mod config;
pub mod error;
mod exporter;
pub mod instrumentation;
pub mod schedule;
pub mod telemetry;

pub use config::{MetricExporterKind, TelemetryConfig, TraceExporterKind};
pub use error::TelemetryError;
pub use instrumentation::Instrumentation;
pub use telemetry::{InstallScope, LifecycleState, SdkHandle, TelemetryBootstrap};
