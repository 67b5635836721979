// SPDX-License-Identifier: MIT
//! Error taxonomy for the telemetry bootstrap.

use thiserror::Error;

/// Errors produced while configuring, starting or using telemetry.
///
/// Everything except [`TelemetryError::ExporterUnreachable`] is fatal: it is
/// returned to the caller and should abort startup. Export failures are only
/// ever logged by the background export task.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A configuration value is missing, malformed or unrecognized.
    #[error("invalid telemetry config: {0}")]
    InvalidConfig(String),

    /// `initialize` was called outside a Tokio runtime.
    #[error("telemetry must be initialized from within a Tokio runtime")]
    NoRuntime,

    /// An exporter could not be constructed (e.g. a malformed endpoint).
    #[error("failed to build exporter: {0}")]
    Exporter(#[from] opentelemetry_otlp::ExporterBuildError),

    /// A process-wide hook could not be installed.
    #[error("failed to install instrumentation: {0}")]
    Install(String),

    #[error("telemetry is already initialized")]
    AlreadyInitialized,

    #[error("telemetry has already been shut down")]
    AlreadyShutdown,

    /// A single export cycle failed. Never returned to application code.
    #[error("exporter unreachable: {0}")]
    ExporterUnreachable(String),
}

impl TelemetryError {
    /// Whether the error should abort startup.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, TelemetryError::ExporterUnreachable(_))
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        TelemetryError::InvalidConfig(msg.into())
    }
}

pub type Result<T, E = TelemetryError> = std::result::Result<T, E>;
