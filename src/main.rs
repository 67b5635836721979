// SPDX-License-Identifier: MIT
use anyhow::Result;
use opentelemetry::KeyValue;
use otel_bootstrap::telemetry::{initialize, shutdown_async};
use otel_bootstrap::TelemetryConfig;
use tracing::{info, instrument};

#[instrument]
async fn simulated_work(iteration: u64) {
    info!(task = "simulated_work", "starting task");
    // Placeholder for actual business logic
    tokio::time::sleep(std::time::Duration::from_millis(150)).await;
    info!(task = "simulated_work", "completed task");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Traces to the collector over gRPC, metrics to the console unless the
    // environment says otherwise.
    let mut config = TelemetryConfig::from_env()?;
    config
        .resource_attributes
        .entry("my-org-service-version".into())
        .or_insert_with(|| env!("CARGO_PKG_VERSION").into());

    let telemetry = initialize(config)?;
    info!("application started");

    let runs = telemetry.meter("demo")?.u64_counter("demo.runs").build();
    for iteration in 0..3 {
        simulated_work(iteration).await;
        runs.add(1, &[KeyValue::new("outcome", "ok")]);
    }

    info!("shutting down");
    shutdown_async(&telemetry).await;
    Ok(())
}
