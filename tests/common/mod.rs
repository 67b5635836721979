// SPDX-License-Identifier: MIT
#![allow(dead_code)]

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;

use opentelemetry_sdk::error::OTelSdkResult;
use opentelemetry_sdk::trace::{SpanData, SpanExporter};
use opentelemetry_sdk::Resource;
use otel_bootstrap::{MetricExporterKind, TelemetryConfig, TraceExporterKind};
use parking_lot::Mutex;

/// Keeps every exported span together with the resource the provider
/// attached to the exporter.
#[derive(Clone, Debug, Default)]
pub struct RecordingSpanExporter {
    spans: Arc<Mutex<Vec<SpanData>>>,
    resource: Arc<Mutex<Option<Resource>>>,
}

impl RecordingSpanExporter {
    pub fn spans(&self) -> Vec<SpanData> {
        self.spans.lock().clone()
    }

    pub fn resource(&self) -> Option<Resource> {
        self.resource.lock().clone()
    }
}

impl SpanExporter for RecordingSpanExporter {
    fn export(&self, batch: Vec<SpanData>) -> impl Future<Output = OTelSdkResult> + Send {
        self.spans.lock().extend(batch);
        std::future::ready(Ok(()))
    }

    fn set_resource(&mut self, resource: &Resource) {
        *self.resource.lock() = Some(resource.clone());
    }
}

/// No exporters, span bridge only.
pub fn quiet_config() -> TelemetryConfig {
    TelemetryConfig {
        trace_exporter: TraceExporterKind::None,
        metric_exporter: MetricExporterKind::None,
        instrumentations: BTreeSet::from(["tracing".to_string()]),
        log_filter: "trace".into(),
        shutdown_grace_millis: 500,
        ..Default::default()
    }
}
