// SPDX-License-Identifier: MIT
//! Telemetry bootstrap: builds the providers described by a
//! [`TelemetryConfig`], installs the requested instrumentation and hands back
//! an [`SdkHandle`] that owns them until shutdown.
//!
//! The public API mirrors a typical service startup:
//!
//! * [`initialize`] – start telemetry for the whole process (exactly once).
//! * [`shutdown`] / [`shutdown_async`] – flush and close everything;
//!   idempotent.
//! * [`TelemetryBootstrap`] – the same lifecycle as an explicit value, either
//!   process-wide or [`InstallScope::Isolated`] for tests.
//!
//! # Example
//! ```no_run
//! use otel_bootstrap::telemetry::{initialize, shutdown_async};
//! use otel_bootstrap::TelemetryConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let handle = initialize(TelemetryConfig::from_env()?)?;
//!     // ... application logic ...
//!     shutdown_async(&handle).await; // ensure final spans and metrics are exported
//!     Ok(())
//! }
//! ```
//!
//! # Lifecycle
//! `Uninitialized -> Initializing -> Running -> ShuttingDown -> Stopped`.
//! Initializing a running bootstrap fails with
//! [`TelemetryError::AlreadyInitialized`]; anything but `shutdown` on a
//! stopped one fails with [`TelemetryError::AlreadyShutdown`]. A failed
//! initialization leaves nothing installed and returns to `Uninitialized`.
//!
//! # Threading Model
//! `initialize` must run inside a Tokio runtime: the metric export cycle is a
//! Tokio task and the gRPC exporters bind to the runtime. Batch span export
//! runs on the SDK's own worker thread. `shutdown` blocks for at most the
//! configured grace period per provider. gRPC exporters send their final
//! batch through tasks on the current runtime, so async callers (and every
//! current-thread runtime) should use [`SdkHandle::shutdown_async`], which
//! blocks a pool thread instead of the runtime thread.
use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, LazyLock, Weak};
use std::time::Duration;

use opentelemetry::metrics::{Meter, MeterProvider as _};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{global, KeyValue};
use opentelemetry_sdk::metrics::exporter::PushMetricExporter;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace::{SdkTracer, SdkTracerProvider, SpanExporter};
use opentelemetry_sdk::Resource;
#[cfg(feature = "otlp-log")]
use opentelemetry_sdk::logs::SdkLoggerProvider;
use parking_lot::Mutex;
use tracing::{info, warn, Dispatch};
use tracing_subscriber::EnvFilter;

use crate::config::TelemetryConfig;
use crate::error::{Result, TelemetryError};
use crate::exporter::{self, MetricPipeline, OtlpTarget, SpanPipeline};
use crate::instrumentation::{self, Instrumentation};
use crate::schedule::PeriodicExport;

const SCOPE_NAME: &str = env!("CARGO_PKG_NAME");

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Initializing,
    Running,
    ShuttingDown,
    Stopped,
}

/// Where instrumentation is installed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InstallScope {
    /// Global subscriber, global OpenTelemetry providers, propagator and
    /// panic hook. Only one bootstrap per process can run in this scope.
    #[default]
    Process,
    /// Nothing process-wide is touched. Spans are recorded only inside
    /// [`SdkHandle::in_scope`] or while [`SdkHandle::dispatch`] is the
    /// current default.
    Isolated,
}

#[derive(Debug)]
struct Lifecycle(Mutex<LifecycleState>);

impl Lifecycle {
    fn new() -> Self {
        Self(Mutex::new(LifecycleState::Uninitialized))
    }

    fn state(&self) -> LifecycleState {
        *self.0.lock()
    }

    fn set(&self, state: LifecycleState) {
        *self.0.lock() = state;
    }

    fn begin_initialize(&self) -> Result<()> {
        let mut state = self.0.lock();
        match *state {
            LifecycleState::Uninitialized => {
                *state = LifecycleState::Initializing;
                Ok(())
            }
            LifecycleState::Stopped => Err(TelemetryError::AlreadyShutdown),
            _ => Err(TelemetryError::AlreadyInitialized),
        }
    }

    /// Claims the shutdown. Only the first caller out of `Running` gets `true`.
    fn begin_shutdown(&self) -> bool {
        let mut state = self.0.lock();
        if *state == LifecycleState::Running {
            *state = LifecycleState::ShuttingDown;
            true
        } else {
            false
        }
    }

    fn ensure_running(&self) -> Result<()> {
        match self.state() {
            LifecycleState::Running => Ok(()),
            _ => Err(TelemetryError::AlreadyShutdown),
        }
    }
}

struct Providers {
    tracer: SdkTracerProvider,
    meter: SdkMeterProvider,
    #[cfg(feature = "otlp-log")]
    logger: Option<SdkLoggerProvider>,
}

impl Providers {
    fn force_flush(&self) {
        if let Err(e) = self.tracer.force_flush() {
            warn!(error = %e, "failed to flush spans");
        }
        if let Err(e) = self.meter.force_flush() {
            warn!(error = %e, "failed to flush metrics");
        }
        #[cfg(feature = "otlp-log")]
        if let Some(Err(e)) = self.logger.as_ref().map(|l| l.force_flush()) {
            warn!(error = %e, "failed to flush logs");
        }
    }

    fn shutdown(&self, grace: Duration) {
        if let Err(e) = self.meter.shutdown_with_timeout(grace) {
            warn!(error = %e, "meter provider shutdown failed");
        }
        if let Err(e) = self.tracer.shutdown_with_timeout(grace) {
            warn!(error = %e, "tracer provider shutdown failed");
        }
        #[cfg(feature = "otlp-log")]
        if let Some(Err(e)) = self.logger.as_ref().map(|l| l.shutdown_with_timeout(grace)) {
            warn!(error = %e, "logger provider shutdown failed");
        }
    }
}

struct HandleInner {
    lifecycle: Arc<Lifecycle>,
    providers: Providers,
    export: Option<PeriodicExport>,
    dispatch: Dispatch,
    resource: Resource,
    installed: BTreeSet<Instrumentation>,
    grace: Duration,
}

impl HandleInner {
    fn shutdown(&self) {
        if !self.lifecycle.begin_shutdown() {
            return;
        }
        if let Some(export) = &self.export {
            export.cancel();
        }
        self.providers.shutdown(self.grace);
        self.lifecycle.set(LifecycleState::Stopped);
        info!("telemetry stopped");
    }
}

/// Owner of the running providers.
///
/// Dropping the handle shuts telemetry down, so keep it alive for as long as
/// the process should be observed (typically a local in `main`). Calling
/// [`SdkHandle::shutdown`] explicitly is still preferred: it makes the flush
/// point visible.
pub struct SdkHandle {
    inner: Arc<HandleInner>,
}

impl SdkHandle {
    pub fn state(&self) -> LifecycleState {
        self.inner.lifecycle.state()
    }

    /// Resource attached to everything this handle exports.
    pub fn resource(&self) -> &Resource {
        &self.inner.resource
    }

    /// Instrumentations that were actually installed.
    pub fn instrumentations(&self) -> &BTreeSet<Instrumentation> {
        &self.inner.installed
    }

    /// Metric export cycles started so far (0 when metrics are disabled).
    pub fn export_attempts(&self) -> u64 {
        self.inner.export.as_ref().map_or(0, PeriodicExport::attempts)
    }

    /// The subscriber assembled from the enabled layers.
    pub fn dispatch(&self) -> &Dispatch {
        &self.inner.dispatch
    }

    /// Run `f` with this handle's subscriber as the thread's default.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.inner.dispatch, f)
    }

    pub fn tracer(&self, name: &'static str) -> Result<SdkTracer> {
        self.inner.lifecycle.ensure_running()?;
        Ok(self.inner.providers.tracer.tracer(name))
    }

    pub fn meter(&self, name: &'static str) -> Result<Meter> {
        self.inner.lifecycle.ensure_running()?;
        Ok(self.inner.providers.meter.meter(name))
    }

    /// Export everything buffered so far. Export failures are logged, not
    /// returned.
    pub fn force_flush(&self) -> Result<()> {
        self.inner.lifecycle.ensure_running()?;
        self.inner.providers.force_flush();
        Ok(())
    }

    /// Cancel the export timer, flush and close every provider.
    ///
    /// Each provider gets the configured grace period for in-flight exports.
    /// Calling this again, or dropping the handle afterwards, does nothing.
    pub fn shutdown(&self) {
        self.inner.shutdown();
    }

    /// [`shutdown`](Self::shutdown) on the blocking pool.
    ///
    /// The runtime thread stays free while the providers flush, which the
    /// gRPC exporters need on a current-thread runtime to send anything.
    pub async fn shutdown_async(&self) {
        let inner = Arc::clone(&self.inner);
        if let Err(e) = tokio::task::spawn_blocking(move || inner.shutdown()).await {
            warn!(error = %e, "telemetry shutdown task failed");
        }
    }
}

impl Drop for SdkHandle {
    fn drop(&mut self) {
        self.inner.shutdown();
    }
}

impl fmt::Debug for SdkHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SdkHandle")
            .field("state", &self.state())
            .field("instrumentations", &self.inner.installed)
            .finish_non_exhaustive()
    }
}

/// A telemetry lifecycle: one `initialize`, one effective `shutdown`.
pub struct TelemetryBootstrap {
    scope: InstallScope,
    lifecycle: Arc<Lifecycle>,
    spans: Option<SpanPipeline>,
    metrics: Option<MetricPipeline>,
}

/// Builder for [`TelemetryBootstrap`] with custom exporters.
#[derive(Default)]
pub struct TelemetryBootstrapBuilder {
    scope: InstallScope,
    spans: Option<SpanPipeline>,
    metrics: Option<MetricPipeline>,
}

impl TelemetryBootstrapBuilder {
    pub fn scope(mut self, scope: InstallScope) -> Self {
        self.scope = scope;
        self
    }

    /// Send spans to `exporter` (unbatched) instead of the configured trace
    /// exporter kind.
    pub fn span_exporter<E>(mut self, exporter: E) -> Self
    where
        E: SpanExporter + Clone + Send + Sync + 'static,
    {
        self.spans = Some(exporter::span_pipeline(exporter));
        self
    }

    /// Send metrics to `exporter` instead of the configured metric exporter
    /// kind. The export cadence still follows the config.
    pub fn metric_exporter<E>(mut self, exporter: E) -> Self
    where
        E: PushMetricExporter + Clone + Send + Sync + 'static,
    {
        self.metrics = Some(exporter::metric_pipeline(exporter));
        self
    }

    pub fn build(self) -> TelemetryBootstrap {
        TelemetryBootstrap {
            scope: self.scope,
            lifecycle: Arc::new(Lifecycle::new()),
            spans: self.spans,
            metrics: self.metrics,
        }
    }
}

impl TelemetryBootstrap {
    pub fn new(scope: InstallScope) -> Self {
        Self::builder().scope(scope).build()
    }

    pub fn builder() -> TelemetryBootstrapBuilder {
        TelemetryBootstrapBuilder::default()
    }

    pub fn scope(&self) -> InstallScope {
        self.scope
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Start telemetry described by `config`.
    ///
    /// Everything that can be rejected (config values, instrumentation ids,
    /// log filter, missing runtime, exporter construction) is checked before
    /// anything is installed. Exporters do not connect here, so an
    /// unreachable collector never delays or fails startup.
    ///
    /// # Errors
    /// * [`TelemetryError::AlreadyInitialized`] / [`TelemetryError::AlreadyShutdown`]
    ///   when this bootstrap already ran.
    /// * [`TelemetryError::InvalidConfig`], [`TelemetryError::NoRuntime`],
    ///   [`TelemetryError::Exporter`] for rejected input.
    /// * [`TelemetryError::Install`] when another global subscriber is set.
    pub fn initialize(&self, config: TelemetryConfig) -> Result<SdkHandle> {
        self.lifecycle.begin_initialize()?;
        match self.start(&config) {
            Ok(handle) => {
                self.lifecycle.set(LifecycleState::Running);
                info!(
                    service = %config.service_name,
                    trace_exporter = %config.trace_exporter,
                    metric_exporter = %config.metric_exporter,
                    interval_ms = config.metric_export_interval_millis,
                    "telemetry initialized"
                );
                Ok(handle)
            }
            Err(e) => {
                self.lifecycle.set(LifecycleState::Uninitialized);
                Err(e)
            }
        }
    }

    /// [`initialize`](Self::initialize) with a config read through `lookup`;
    /// see [`TelemetryConfig::from_lookup`].
    pub fn initialize_from_lookup<F>(&self, lookup: F) -> Result<SdkHandle>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = TelemetryConfig::from_lookup(lookup)?;
        self.initialize(config)
    }

    fn start(&self, config: &TelemetryConfig) -> Result<SdkHandle> {
        config.validate()?;
        let requested = instrumentation::resolve(&config.instrumentations)?;
        let filter = EnvFilter::try_new(&config.log_filter).map_err(|e| {
            TelemetryError::invalid(format!("log filter `{}`: {e}", config.log_filter))
        })?;
        tokio::runtime::Handle::try_current().map_err(|_| TelemetryError::NoRuntime)?;

        let resource = build_resource(config);
        let target = OtlpTarget {
            endpoint: config.otlp_endpoint.as_deref(),
            timeout: config.export_timeout(),
        };

        let tracer_builder = SdkTracerProvider::builder().with_resource(resource.clone());
        let tracer_builder = match &self.spans {
            Some(pipeline) => pipeline(tracer_builder),
            None => exporter::attach_span_exporter(tracer_builder, config.trace_exporter, target)?,
        };
        let meter_builder = SdkMeterProvider::builder().with_resource(resource.clone());
        let (meter_builder, export_metrics) = match &self.metrics {
            Some(pipeline) => (pipeline(meter_builder), true),
            None => exporter::attach_metric_reader(meter_builder, config.metric_exporter, target)?,
        };
        #[cfg(feature = "otlp-log")]
        let logger = if requested.contains(&Instrumentation::Logs) {
            Some(exporter::logger_provider(config.trace_exporter, target, resource.clone())?)
        } else {
            None
        };

        let providers = Providers {
            tracer: tracer_builder.build(),
            meter: meter_builder.build(),
            #[cfg(feature = "otlp-log")]
            logger,
        };

        let tracer = providers.tracer.tracer(SCOPE_NAME);
        #[cfg(feature = "otlp-log")]
        let dispatch = instrumentation::build_dispatch(
            filter,
            &requested,
            tracer,
            providers.logger.as_ref(),
        );
        #[cfg(not(feature = "otlp-log"))]
        let dispatch = instrumentation::build_dispatch(filter, &requested, tracer);

        if self.scope == InstallScope::Process {
            if let Err(e) = tracing::dispatcher::set_global_default(dispatch.clone()) {
                providers.shutdown(config.shutdown_grace());
                return Err(TelemetryError::Install(e.to_string()));
            }
        }

        // Nothing below can fail.
        let export = export_metrics.then(|| {
            PeriodicExport::spawn(
                Arc::new(providers.meter.clone()),
                config.metric_export_interval(),
                config.export_timeout(),
            )
        });
        let installed = requested
            .iter()
            .copied()
            .filter(|i| self.scope == InstallScope::Process || !i.is_process_wide())
            .collect::<BTreeSet<_>>();

        let inner = Arc::new(HandleInner {
            lifecycle: Arc::clone(&self.lifecycle),
            providers,
            export,
            dispatch,
            resource,
            installed,
            grace: config.shutdown_grace(),
        });

        if self.scope == InstallScope::Process {
            global::set_tracer_provider(inner.providers.tracer.clone());
            global::set_meter_provider(inner.providers.meter.clone());
            if inner.installed.contains(&Instrumentation::Propagation) {
                instrumentation::install_propagator();
            }
            if inner.installed.contains(&Instrumentation::Panic) {
                let weak = Arc::downgrade(&inner);
                instrumentation::install_panic_hook(move || flush_on_panic(&weak));
            }
        }

        Ok(SdkHandle { inner })
    }
}

impl fmt::Debug for TelemetryBootstrap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelemetryBootstrap")
            .field("scope", &self.scope)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

fn flush_on_panic(inner: &Weak<HandleInner>) {
    if let Some(inner) = inner.upgrade() {
        if inner.lifecycle.state() == LifecycleState::Running {
            inner.providers.force_flush();
        }
    }
}

fn build_resource(config: &TelemetryConfig) -> Resource {
    let mut builder = Resource::builder();
    if !config.service_name.is_empty() {
        builder = builder.with_service_name(config.service_name.clone());
    }
    builder
        .with_attributes(
            config
                .resource_attributes
                .iter()
                .map(|(key, value)| KeyValue::new(key.clone(), value.clone())),
        )
        .build()
}

static PROCESS: LazyLock<TelemetryBootstrap> =
    LazyLock::new(|| TelemetryBootstrap::new(InstallScope::Process));

/// Initialize telemetry for the whole process.
///
/// Call this first thing in `main`, inside the Tokio runtime: code that ran
/// before it is never observed. A second call fails with
/// [`TelemetryError::AlreadyInitialized`] and installs nothing.
///
/// # Examples
/// ```no_run
/// use otel_bootstrap::telemetry::initialize;
/// use otel_bootstrap::TelemetryConfig;
/// # #[tokio::main] async fn main() {
/// let handle = initialize(TelemetryConfig::default()).expect("init");
/// // ... run logic ...
/// handle.shutdown();
/// # }
/// ```
pub fn initialize(config: TelemetryConfig) -> Result<SdkHandle> {
    PROCESS.initialize(config)
}

/// Flush and close the providers owned by `handle`. Idempotent.
pub fn shutdown(handle: &SdkHandle) {
    handle.shutdown();
}

/// [`shutdown`] without blocking the runtime thread; see
/// [`SdkHandle::shutdown_async`].
pub async fn shutdown_async(handle: &SdkHandle) {
    handle.shutdown_async().await;
}

/// Lifecycle state of the process-wide bootstrap.
pub fn process_state() -> LifecycleState {
    PROCESS.state()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MetricExporterKind, TraceExporterKind};
    use opentelemetry::Key;
    use tokio_test::{assert_err, assert_ok};

    fn quiet_config() -> TelemetryConfig {
        TelemetryConfig {
            trace_exporter: TraceExporterKind::None,
            metric_exporter: MetricExporterKind::None,
            instrumentations: BTreeSet::from(["tracing".to_string()]),
            shutdown_grace_millis: 500,
            ..Default::default()
        }
    }

    fn isolated() -> TelemetryBootstrap {
        TelemetryBootstrap::new(InstallScope::Isolated)
    }

    #[tokio::test]
    async fn initialize_then_shutdown_stops() {
        let bootstrap = isolated();
        assert_eq!(bootstrap.state(), LifecycleState::Uninitialized);

        let handle = assert_ok!(bootstrap.initialize(quiet_config()));
        assert_eq!(bootstrap.state(), LifecycleState::Running);

        handle.shutdown();
        assert_eq!(bootstrap.state(), LifecycleState::Stopped);
        assert_eq!(handle.state(), LifecycleState::Stopped);
    }

    #[tokio::test]
    async fn second_initialize_is_rejected() {
        let bootstrap = isolated();
        let handle = assert_ok!(bootstrap.initialize(quiet_config()));

        let err = assert_err!(bootstrap.initialize(quiet_config()));
        assert!(matches!(err, TelemetryError::AlreadyInitialized));
        assert_eq!(handle.state(), LifecycleState::Running);
    }

    #[tokio::test]
    async fn shutdown_twice_is_a_no_op() {
        let bootstrap = isolated();
        let handle = assert_ok!(bootstrap.initialize(quiet_config()));
        handle.shutdown();
        shutdown(&handle);
        assert_eq!(handle.state(), LifecycleState::Stopped);
    }

    #[tokio::test]
    async fn operations_after_stop_fail() {
        let bootstrap = isolated();
        let handle = assert_ok!(bootstrap.initialize(quiet_config()));
        handle.shutdown();

        assert!(matches!(handle.force_flush(), Err(TelemetryError::AlreadyShutdown)));
        assert!(matches!(handle.meter("m"), Err(TelemetryError::AlreadyShutdown)));
        assert!(matches!(handle.tracer("t"), Err(TelemetryError::AlreadyShutdown)));
        assert!(matches!(
            bootstrap.initialize(quiet_config()),
            Err(TelemetryError::AlreadyShutdown)
        ));
    }

    #[tokio::test]
    async fn dropping_the_handle_shuts_down() {
        let bootstrap = isolated();
        let handle = assert_ok!(bootstrap.initialize(quiet_config()));
        drop(handle);
        assert_eq!(bootstrap.state(), LifecycleState::Stopped);
    }

    #[tokio::test]
    async fn unwinding_past_the_owner_shuts_down() {
        let bootstrap = isolated();
        let handle = assert_ok!(bootstrap.initialize(quiet_config()));

        let unwound = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _handle = handle;
            panic!("request handler failed");
        }));
        assert!(unwound.is_err());
        assert_eq!(bootstrap.state(), LifecycleState::Stopped);
    }

    #[tokio::test]
    async fn caller_can_install_the_handle_dispatch() {
        let bootstrap = isolated();
        assert_eq!(bootstrap.scope(), InstallScope::Isolated);
        let handle = assert_ok!(bootstrap.initialize(quiet_config()));

        let span = tracing::dispatcher::with_default(handle.dispatch(), || {
            tracing::info_span!("handler")
        });
        assert!(!span.is_disabled());
    }

    #[tokio::test]
    async fn invalid_config_leaves_bootstrap_retryable() {
        let bootstrap = isolated();
        let mut config = quiet_config();
        config.instrumentations.insert("express".into());

        let err = assert_err!(bootstrap.initialize(config));
        assert!(matches!(err, TelemetryError::InvalidConfig(_)));
        assert_eq!(bootstrap.state(), LifecycleState::Uninitialized);

        let handle = assert_ok!(bootstrap.initialize(quiet_config()));
        assert_eq!(handle.state(), LifecycleState::Running);
    }

    #[tokio::test]
    async fn bad_log_filter_is_invalid_config() {
        let bootstrap = isolated();
        let config = TelemetryConfig {
            log_filter: "checkout=loud".into(),
            ..quiet_config()
        };
        let err = assert_err!(bootstrap.initialize(config));
        assert!(matches!(err, TelemetryError::InvalidConfig(_)));
    }

    #[test]
    fn initialize_requires_a_runtime() {
        let bootstrap = isolated();
        let err = assert_err!(bootstrap.initialize(quiet_config()));
        assert!(matches!(err, TelemetryError::NoRuntime));
        assert_eq!(bootstrap.state(), LifecycleState::Uninitialized);
    }

    #[tokio::test]
    async fn isolated_scope_skips_process_wide_hooks() {
        let bootstrap = isolated();
        let config = TelemetryConfig {
            instrumentations: BTreeSet::from(["auto".to_string()]),
            ..quiet_config()
        };
        let handle = assert_ok!(bootstrap.initialize(config));

        assert!(handle.instrumentations().contains(&Instrumentation::Tracing));
        assert!(!handle.instrumentations().contains(&Instrumentation::Panic));
        assert!(!handle.instrumentations().contains(&Instrumentation::Propagation));
    }

    #[tokio::test]
    async fn resource_carries_configured_attributes() {
        let bootstrap = isolated();
        let mut config = quiet_config();
        config.service_name = "checkout".into();
        config
            .resource_attributes
            .insert("my-org-service-version".into(), "2.0.1".into());

        let handle = assert_ok!(bootstrap.initialize(config));
        let resource = handle.resource();
        assert_eq!(
            resource.get(&Key::new("my-org-service-version")),
            Some("2.0.1".into())
        );
        assert_eq!(resource.get(&Key::new("service.name")), Some("checkout".into()));
    }

    #[tokio::test]
    async fn metrics_disabled_means_no_export_cycles() {
        let bootstrap = isolated();
        let handle = assert_ok!(bootstrap.initialize(quiet_config()));
        assert_eq!(handle.export_attempts(), 0);
        assert_ok!(handle.force_flush());
    }
}
