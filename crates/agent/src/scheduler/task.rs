use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};

use super::jitter::spread_interval;
use crate::monitor::{Monitor, PassContext};
use crate::reconciler::Reconciler;
use vigil_common::now_ms;

/// Periodic evaluation loop for one monitor.
pub struct MonitorTask {
    pub monitor: Arc<dyn Monitor>,
    pub reconciler: Arc<Reconciler>,
    pub interval: Duration,
    pub jitter_fraction: f64,
    pub ttl: Option<Duration>,
}

impl MonitorTask {
    /// Runs passes until `shutdown` flips to true or its sender is dropped.
    /// Cancellation is checked between passes; a pass in progress always
    /// completes.
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let source_id = self.monitor.source_id().to_string();
            tracing::info!(source_id = %source_id, interval_s = self.interval.as_secs_f64(), "monitor loop started");

            let mut passes: u64 = 0;
            loop {
                if *shutdown.borrow() {
                    break;
                }

                passes += 1;
                self.run_pass(&source_id, passes).await;

                let wait = spread_interval(self.interval, self.jitter_fraction);
                tokio::select! {
                    _ = tokio::time::sleep(wait) => {}
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }

            tracing::info!(source_id = %source_id, passes, "monitor loop exited");
        })
    }

    /// One pass in its own task so a panic cannot take the loop down.
    /// Failures become a Warning on the monitor's own identity.
    async fn run_pass(&self, source_id: &str, pass: u64) {
        let ctx = PassContext::new(self.reconciler.clone(), source_id, now_ms(), self.ttl);
        let monitor = self.monitor.clone();
        let pass_task = tokio::spawn(async move { monitor.run_pass(ctx).await });
        // An aborted loop must not leave its pass running behind it.
        let _guard = AbortOnDrop(pass_task.abort_handle());
        let joined = pass_task.await;

        let failure = match joined {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(e) if e.is_panic() => Some(format!("pass panicked: {}", panic_message(e.into_panic()))),
            Err(e) => Some(format!("pass cancelled: {e}")),
        };

        match failure {
            None => {
                self.reconciler.clear_monitor_failure(source_id, now_ms()).await;
            }
            Some(message) => {
                self.reconciler.state().increment_pass_failures();
                tracing::warn!(source_id, pass, error = %message, "monitor pass failed");
                self.reconciler
                    .report_monitor_failure(source_id, &message, now_ms())
                    .await;
            }
        }
    }
}

struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        return (*s).to_string();
    }
    if let Some(s) = payload.downcast_ref::<String>() {
        return s.clone();
    }
    "unknown panic payload".to_string()
}
