// SPDX-License-Identifier: MIT
//! Exporter dispatch: maps each configured exporter kind onto the provider
//! builder it configures.
//!
//! OTLP exporters never connect while being built, so an unreachable
//! collector cannot delay startup; connection errors surface later, per
//! export.
use std::sync::Arc;
use std::time::Duration;

use opentelemetry_otlp::{self as otlp, Protocol, WithExportConfig};
use opentelemetry_sdk::metrics::exporter::PushMetricExporter;
use opentelemetry_sdk::metrics::{MeterProviderBuilder, PeriodicReader};
use opentelemetry_sdk::trace::{SpanExporter, TracerProviderBuilder};
#[cfg(feature = "otlp-log")]
use opentelemetry_sdk::{logs::SdkLoggerProvider, Resource};

use crate::config::{MetricExporterKind, TraceExporterKind};
use crate::error::Result;

/// Interval handed to the SDK periodic reader. Collection is driven by the
/// export task, so the reader's own timer must never fire first.
pub(crate) const READER_IDLE_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Replaces kind dispatch for traces.
pub(crate) type SpanPipeline =
    Arc<dyn Fn(TracerProviderBuilder) -> TracerProviderBuilder + Send + Sync>;
/// Replaces kind dispatch for metrics.
pub(crate) type MetricPipeline =
    Arc<dyn Fn(MeterProviderBuilder) -> MeterProviderBuilder + Send + Sync>;

/// Where OTLP exporters send data.
#[derive(Clone, Copy, Debug)]
pub(crate) struct OtlpTarget<'a> {
    pub endpoint: Option<&'a str>,
    pub timeout: Duration,
}

fn http_endpoint(base: &str, signal: &str) -> String {
    format!("{}/v1/{signal}", base.trim_end_matches('/'))
}

pub(crate) fn attach_span_exporter(
    builder: TracerProviderBuilder,
    kind: TraceExporterKind,
    target: OtlpTarget<'_>,
) -> Result<TracerProviderBuilder> {
    let builder = match kind {
        TraceExporterKind::OtlpGrpc => {
            let mut exporter = otlp::SpanExporter::builder()
                .with_tonic()
                .with_timeout(target.timeout);
            if let Some(endpoint) = target.endpoint {
                exporter = exporter.with_endpoint(endpoint);
            }
            builder.with_batch_exporter(exporter.build()?)
        }
        TraceExporterKind::OtlpHttp => {
            let mut exporter = otlp::SpanExporter::builder()
                .with_http()
                .with_protocol(Protocol::HttpBinary)
                .with_timeout(target.timeout);
            if let Some(base) = target.endpoint {
                exporter = exporter.with_endpoint(http_endpoint(base, "traces"));
            }
            builder.with_batch_exporter(exporter.build()?)
        }
        TraceExporterKind::Console => {
            builder.with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
        }
        TraceExporterKind::None => builder,
    };
    Ok(builder)
}

/// Attach a metric reader for `kind`. Returns whether one was attached, i.e.
/// whether an export task is needed.
pub(crate) fn attach_metric_reader(
    builder: MeterProviderBuilder,
    kind: MetricExporterKind,
    target: OtlpTarget<'_>,
) -> Result<(MeterProviderBuilder, bool)> {
    let builder = match kind {
        MetricExporterKind::OtlpGrpc => {
            let mut exporter = otlp::MetricExporter::builder()
                .with_tonic()
                .with_timeout(target.timeout);
            if let Some(endpoint) = target.endpoint {
                exporter = exporter.with_endpoint(endpoint);
            }
            with_periodic_reader(builder, exporter.build()?)
        }
        MetricExporterKind::OtlpHttp => {
            let mut exporter = otlp::MetricExporter::builder()
                .with_http()
                .with_protocol(Protocol::HttpBinary)
                .with_timeout(target.timeout);
            if let Some(base) = target.endpoint {
                exporter = exporter.with_endpoint(http_endpoint(base, "metrics"));
            }
            with_periodic_reader(builder, exporter.build()?)
        }
        MetricExporterKind::Console => {
            with_periodic_reader(builder, opentelemetry_stdout::MetricExporter::default())
        }
        MetricExporterKind::None => return Ok((builder, false)),
    };
    Ok((builder, true))
}

fn with_periodic_reader<E>(builder: MeterProviderBuilder, exporter: E) -> MeterProviderBuilder
where
    E: PushMetricExporter,
{
    builder.with_reader(
        PeriodicReader::builder(exporter)
            .with_interval(READER_IDLE_INTERVAL)
            .build(),
    )
}

/// Spans go straight to `exporter` through a simple (unbatched) processor.
pub(crate) fn span_pipeline<E>(exporter: E) -> SpanPipeline
where
    E: SpanExporter + Clone + Send + Sync + 'static,
{
    Arc::new(move |builder: TracerProviderBuilder| builder.with_simple_exporter(exporter.clone()))
}

pub(crate) fn metric_pipeline<E>(exporter: E) -> MetricPipeline
where
    E: PushMetricExporter + Clone + Send + Sync + 'static,
{
    Arc::new(move |builder: MeterProviderBuilder| with_periodic_reader(builder, exporter.clone()))
}

/// Log exporter following the trace exporter's transport.
#[cfg(feature = "otlp-log")]
pub(crate) fn logger_provider(
    kind: TraceExporterKind,
    target: OtlpTarget<'_>,
    resource: Resource,
) -> Result<SdkLoggerProvider> {
    let builder = SdkLoggerProvider::builder().with_resource(resource);
    let builder = match kind {
        TraceExporterKind::OtlpGrpc => {
            let mut exporter = otlp::LogExporter::builder()
                .with_tonic()
                .with_timeout(target.timeout);
            if let Some(endpoint) = target.endpoint {
                exporter = exporter.with_endpoint(endpoint);
            }
            builder.with_batch_exporter(exporter.build()?)
        }
        TraceExporterKind::OtlpHttp => {
            let mut exporter = otlp::LogExporter::builder()
                .with_http()
                .with_protocol(Protocol::HttpBinary)
                .with_timeout(target.timeout);
            if let Some(base) = target.endpoint {
                exporter = exporter.with_endpoint(http_endpoint(base, "logs"));
            }
            builder.with_batch_exporter(exporter.build()?)
        }
        TraceExporterKind::Console => {
            builder.with_simple_exporter(opentelemetry_stdout::LogExporter::default())
        }
        TraceExporterKind::None => builder,
    };
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry_sdk::metrics::SdkMeterProvider;
    use opentelemetry_sdk::trace::SdkTracerProvider;

    const TARGET: OtlpTarget<'static> = OtlpTarget {
        endpoint: Some("http://127.0.0.1:1"),
        timeout: Duration::from_millis(200),
    };

    #[test]
    fn http_endpoint_appends_signal_path() {
        assert_eq!(
            http_endpoint("http://collector:4318/", "traces"),
            "http://collector:4318/v1/traces"
        );
        assert_eq!(
            http_endpoint("http://collector:4318", "metrics"),
            "http://collector:4318/v1/metrics"
        );
    }

    #[test]
    fn none_attaches_no_metric_reader() {
        let (_, attached) =
            attach_metric_reader(SdkMeterProvider::builder(), MetricExporterKind::None, TARGET)
                .expect("none");
        assert!(!attached);
    }

    #[test]
    fn console_exporters_build_without_collector() {
        let (builder, attached) =
            attach_metric_reader(SdkMeterProvider::builder(), MetricExporterKind::Console, TARGET)
                .expect("console metrics");
        assert!(attached);
        let meters = builder.build();

        let tracers = attach_span_exporter(
            SdkTracerProvider::builder(),
            TraceExporterKind::Console,
            TARGET,
        )
        .expect("console spans")
        .build();

        let _ = tracers.shutdown();
        let _ = meters.shutdown();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn grpc_exporters_build_against_unreachable_endpoint() {
        let tracers = attach_span_exporter(
            SdkTracerProvider::builder(),
            TraceExporterKind::OtlpGrpc,
            TARGET,
        )
        .expect("grpc spans")
        .build();
        let (builder, attached) =
            attach_metric_reader(SdkMeterProvider::builder(), MetricExporterKind::OtlpGrpc, TARGET)
                .expect("grpc metrics");
        assert!(attached);
        let meters = builder.build();

        // Nothing was exported, so shutdown has nothing to send.
        let _ = tracers.shutdown();
        let _ = meters.shutdown();
    }
}
