// SPDX-License-Identifier: MIT
//! Background metric export cycle.
//!
//! The task ticks once per interval (the first tick one full interval after
//! spawn), counts an export attempt and runs the blocking flush on Tokio's
//! blocking pool. A failed or slow cycle is logged and the next tick simply
//! retries; nothing here ever reaches application code.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use opentelemetry_sdk::metrics::SdkMeterProvider;
use tokio::task::{self, JoinHandle};
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::TelemetryError;

/// One collect-and-export pass. Implementations may block.
pub trait ExportCycle: Send + Sync + 'static {
    fn export(&self) -> Result<(), TelemetryError>;
}

impl ExportCycle for SdkMeterProvider {
    fn export(&self) -> Result<(), TelemetryError> {
        self.force_flush()
            .map_err(|e| TelemetryError::ExporterUnreachable(e.to_string()))
    }
}

/// Handle to a running export task.
#[derive(Debug)]
pub struct PeriodicExport {
    cancel: CancellationToken,
    attempts: Arc<AtomicU64>,
    task: JoinHandle<()>,
}

impl PeriodicExport {
    /// Spawn the export loop on the current Tokio runtime.
    pub fn spawn<C: ExportCycle>(cycle: Arc<C>, interval: Duration, timeout: Duration) -> Self {
        let cancel = CancellationToken::new();
        let attempts = Arc::new(AtomicU64::new(0));
        let task = tokio::spawn(run(
            cycle,
            interval,
            timeout,
            cancel.clone(),
            Arc::clone(&attempts),
        ));
        Self {
            cancel,
            attempts,
            task,
        }
    }

    /// Number of export cycles started so far.
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Stop the timer. A cycle already running on the blocking pool is left
    /// to finish; provider shutdown waits for it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PeriodicExport {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run<C: ExportCycle>(
    cycle: Arc<C>,
    interval: Duration,
    timeout: Duration,
    cancel: CancellationToken,
    attempts: Arc<AtomicU64>,
) {
    let mut ticker = time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let attempt = attempts.fetch_add(1, Ordering::Relaxed) + 1;
        let pass = Arc::clone(&cycle);
        let flush = task::spawn_blocking(move || pass.export());

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            outcome = time::timeout(timeout, flush) => match outcome {
                Ok(Ok(Ok(()))) => debug!(attempt, "metrics exported"),
                Ok(Ok(Err(e))) => {
                    warn!(attempt, error = %e, "metric export failed, retrying next cycle")
                }
                Ok(Err(e)) => warn!(attempt, error = %e, "metric export task aborted"),
                Err(_) => warn!(attempt, ?timeout, "metric export timed out"),
            },
        }
    }
    debug!("metric export task stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    #[derive(Default)]
    struct Counting {
        calls: AtomicU64,
        fail: AtomicBool,
    }

    impl ExportCycle for Counting {
        fn export(&self) -> Result<(), TelemetryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(TelemetryError::ExporterUnreachable("connection refused".into()));
            }
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn three_attempts_in_3100ms_at_one_second_interval() {
        let cycle = Arc::new(Counting::default());
        let export = PeriodicExport::spawn(
            Arc::clone(&cycle),
            Duration::from_millis(1000),
            Duration::from_millis(500),
        );

        time::sleep(Duration::from_millis(3100)).await;

        assert_eq!(export.attempts(), 3);
        assert_eq!(cycle.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_do_not_stop_the_schedule() {
        let cycle = Arc::new(Counting::default());
        cycle.fail.store(true, Ordering::SeqCst);
        let export = PeriodicExport::spawn(
            Arc::clone(&cycle),
            Duration::from_millis(100),
            Duration::from_millis(50),
        );

        time::sleep(Duration::from_millis(550)).await;

        assert_eq!(export.attempts(), 5);
        assert!(!export.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_the_timer() {
        let cycle = Arc::new(Counting::default());
        let export = PeriodicExport::spawn(
            Arc::clone(&cycle),
            Duration::from_millis(100),
            Duration::from_millis(50),
        );

        time::sleep(Duration::from_millis(250)).await;
        export.cancel();
        time::sleep(Duration::from_millis(1000)).await;

        assert_eq!(export.attempts(), 2);
        assert!(export.is_finished());
    }
}
