//! Engine health records and the background health monitor

use serde::Serialize;
use std::sync::{Arc, Weak};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::manager::TranslationManager;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(2);

/// Outcome of the latest probe for one engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckRecord {
    pub engine: String,
    /// Unix milliseconds.
    pub timestamp: u64,
    pub healthy: bool,
    pub response_time_ms: u64,
    pub error: Option<String>,
}

pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Keeps the periodic health check alive. Stops on [`stop`](Self::stop) or drop.
pub struct HealthMonitorHandle {
    stop_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl HealthMonitorHandle {
    pub(crate) fn spawn(
        manager: Weak<TranslationManager>,
        interval: Duration,
        initial_delay: Duration,
    ) -> Self {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            tokio::select! {
                _ = &mut stop_rx => return,
                _ = tokio::time::sleep(initial_delay) => {}
            }

            let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {}
                }

                let Some(manager) = manager.upgrade() else {
                    break;
                };
                // A stop request abandons probes still in flight
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = manager.check_all_engines_health() => {}
                }
            }

            tracing::info!("[Health] Health monitor stopped");
        });

        tracing::info!(
            "[Health] Health monitor started (every {}s)",
            interval.as_secs()
        );

        Self {
            stop_tx: Some(stop_tx),
            task,
        }
    }

    pub fn stop(mut self) {
        self.signal_stop();
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    fn signal_stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for HealthMonitorHandle {
    fn drop(&mut self) {
        self.signal_stop();
    }
}
