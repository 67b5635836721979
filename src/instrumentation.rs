// SPDX-License-Identifier: MIT
//! Instrumentation registry.
//!
//! Instrumentations are requested by opaque identifier in
//! [`TelemetryConfig::instrumentations`](crate::config::TelemetryConfig) and
//! resolved here into concrete hooks:
//!
//! * `tracing` – bridge `tracing` spans into OpenTelemetry spans.
//! * `console` – compact console formatter (file/line/thread id).
//! * `logs` – bridge `tracing` events into OpenTelemetry logs (`otlp-log` feature).
//! * `propagation` – install the W3C trace-context propagator globally.
//! * `panic` – record panics as error events and flush telemetry before the
//!   previous panic hook runs.
//! * `auto` – every instrumentation above except `console`.
//!
//! `propagation` and `panic` are process-wide and only installed when the
//! bootstrap runs in [`InstallScope::Process`](crate::telemetry::InstallScope).
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::SdkTracer;
use tracing::Dispatch;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{fmt as console_fmt, layer::SubscriberExt, EnvFilter, Registry};
#[cfg(feature = "otlp-log")]
use {
    opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge,
    opentelemetry_sdk::logs::SdkLoggerProvider,
};

use crate::error::{Result, TelemetryError};

/// Identifier expanding to every instrumentation enabled by default.
pub const AUTO: &str = "auto";

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Instrumentation {
    Tracing,
    Console,
    Logs,
    Propagation,
    Panic,
}

impl Instrumentation {
    const AUTO_SET: [Instrumentation; 4] = [
        Instrumentation::Tracing,
        Instrumentation::Logs,
        Instrumentation::Propagation,
        Instrumentation::Panic,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Instrumentation::Tracing => "tracing",
            Instrumentation::Console => "console",
            Instrumentation::Logs => "logs",
            Instrumentation::Propagation => "propagation",
            Instrumentation::Panic => "panic",
        }
    }

    /// Whether installing the hook mutates process-global state.
    pub fn is_process_wide(self) -> bool {
        matches!(self, Instrumentation::Propagation | Instrumentation::Panic)
    }

    /// Whether this build can provide the hook.
    pub fn is_available(self) -> bool {
        match self {
            Instrumentation::Logs => cfg!(feature = "otlp-log"),
            _ => true,
        }
    }
}

impl fmt::Display for Instrumentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Instrumentation {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "tracing" => Ok(Instrumentation::Tracing),
            "console" => Ok(Instrumentation::Console),
            "logs" => Ok(Instrumentation::Logs),
            "propagation" => Ok(Instrumentation::Propagation),
            "panic" => Ok(Instrumentation::Panic),
            other => Err(TelemetryError::invalid(format!(
                "unrecognized instrumentation `{other}`"
            ))),
        }
    }
}

/// Resolve identifiers into hooks, failing on anything unknown or unavailable.
pub fn resolve(ids: &BTreeSet<String>) -> Result<BTreeSet<Instrumentation>> {
    let mut resolved = BTreeSet::new();
    for id in ids {
        if id.trim() == AUTO {
            resolved.extend(
                Instrumentation::AUTO_SET
                    .into_iter()
                    .filter(|i| i.is_available()),
            );
            continue;
        }
        let instrumentation: Instrumentation = id.parse()?;
        if !instrumentation.is_available() {
            return Err(TelemetryError::invalid(format!(
                "instrumentation `{instrumentation}` requires the `otlp-log` feature"
            )));
        }
        resolved.insert(instrumentation);
    }
    Ok(resolved)
}

/// Compose the subscriber from the enabled layers.
pub(crate) fn build_dispatch(
    filter: EnvFilter,
    enabled: &BTreeSet<Instrumentation>,
    tracer: SdkTracer,
    #[cfg(feature = "otlp-log")] logger_provider: Option<&SdkLoggerProvider>,
) -> Dispatch {
    // Console formatting: plain compact single-line output.
    let console = enabled.contains(&Instrumentation::Console).then(|| {
        console_fmt::layer()
            .with_target(false)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .compact()
    });

    #[cfg(feature = "otlp-log")]
    let bridge = logger_provider
        .filter(|_| enabled.contains(&Instrumentation::Logs))
        .map(|provider| OpenTelemetryTracingBridge::new(provider));
    #[cfg(not(feature = "otlp-log"))]
    let bridge: Option<tracing_subscriber::layer::Identity> = None;

    let spans = enabled
        .contains(&Instrumentation::Tracing)
        .then(|| OpenTelemetryLayer::new(tracer));

    let subscriber = Registry::default()
        .with(filter)
        .with(console)
        .with(bridge)
        .with(spans);
    Dispatch::new(subscriber)
}

pub(crate) fn install_propagator() {
    opentelemetry::global::set_text_map_propagator(TraceContextPropagator::new());
}

/// Chain a hook in front of the current panic hook.
///
/// `on_panic` runs after the panic has been recorded and before the previous
/// hook, so buffered telemetry is flushed even when the process aborts.
pub(crate) fn install_panic_hook<F>(on_panic: F)
where
    F: Fn() + Send + Sync + 'static,
{
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing::error!(panic = %info, "panic");
        on_panic();
        previous(info);
    }));
}
