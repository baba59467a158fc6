//! Periodic health analysis on a background thread.
//!
//! The thread sleeps one interval, runs `analyze_and_notify` for the
//! owner with a fresh "now", and repeats until the handle is shut down
//! or dropped.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;

use super::{HealthMonitor, MonitorError};
use crate::analytics::AnalysisContext;

/// Default analysis interval: every 6 hours.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(6 * 60 * 60);

/// Sleep granularity for shutdown responsiveness.
const SLEEP_GRANULARITY: Duration = Duration::from_millis(250);

/// Handle for the periodic analysis thread.
///
/// Supports graceful shutdown via `shutdown()` or automatic cleanup on `Drop`.
pub struct MonitorHandle {
    shutdown: Arc<AtomicBool>,
    runs: Arc<AtomicUsize>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl MonitorHandle {
    /// Request graceful shutdown. A running analysis completes first.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Completed analysis passes.
    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::Relaxed)
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.shutdown();
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

/// Start periodic analysis for the owner of `base`.
///
/// `base` supplies owner, offset, mode and flags; its clock is replaced
/// on every pass.
pub fn start_periodic_analysis(
    monitor: Arc<HealthMonitor>,
    base: AnalysisContext,
    interval: Duration,
) -> Result<MonitorHandle, MonitorError> {
    let shutdown = Arc::new(AtomicBool::new(false));
    let runs = Arc::new(AtomicUsize::new(0));
    let flag = shutdown.clone();
    let counter = runs.clone();

    let handle = std::thread::Builder::new()
        .name("cardiocheck-monitor".to_string())
        .spawn(move || {
            tracing::info!(
                owner = %base.owner_id,
                interval_secs = interval.as_secs(),
                "Periodic health analysis started"
            );
            monitor_loop(&monitor, &base, interval, &flag, &counter);
            tracing::info!(owner = %base.owner_id, "Periodic health analysis shutting down");
        })?;

    Ok(MonitorHandle {
        shutdown,
        runs,
        handle: Some(handle),
    })
}

fn monitor_loop(
    monitor: &HealthMonitor,
    base: &AnalysisContext,
    interval: Duration,
    shutdown: &AtomicBool,
    runs: &AtomicUsize,
) {
    while !wait_or_shutdown(interval, shutdown) {
        let ctx = base.clone().at(Utc::now().timestamp_millis());
        match monitor.analyze_and_notify(&ctx) {
            Ok(alerts) => {
                tracing::debug!(alerts = alerts.len(), "Periodic analysis pass done");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Periodic analysis pass failed");
            }
        }
        runs.fetch_add(1, Ordering::Relaxed);
    }
}

/// Sleep for `interval` in small steps. Returns true if shutdown was requested.
fn wait_or_shutdown(interval: Duration, shutdown: &AtomicBool) -> bool {
    let deadline = Instant::now() + interval;
    loop {
        if shutdown.load(Ordering::Relaxed) {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        std::thread::sleep((deadline - now).min(SLEEP_GRANULARITY));
    }
}
