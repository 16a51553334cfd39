use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::channel::{ReportSink, SinkError};
use vigil_common::{HealthReport, HealthState, ReportKey};

/// Records every accepted report. Can be told to fail the next `n` calls.
#[derive(Clone, Default)]
pub struct MemorySink {
    accepted: Arc<Mutex<Vec<HealthReport>>>,
    attempts: Arc<AtomicUsize>,
    failures_left: Arc<AtomicUsize>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self, n: usize) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn accepted(&self) -> Vec<HealthReport> {
        self.accepted.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn accepted_count(&self) -> usize {
        self.accepted.lock().map(|v| v.len()).unwrap_or_default()
    }

    pub fn accepted_for(&self, key: &ReportKey) -> Vec<HealthReport> {
        self.accepted()
            .into_iter()
            .filter(|r| &r.key() == key)
            .collect()
    }

    pub fn clears_for(&self, key: &ReportKey) -> usize {
        self.accepted_for(key)
            .iter()
            .filter(|r| r.state == HealthState::Ok && r.emit_ok)
            .count()
    }
}

#[async_trait::async_trait]
impl ReportSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    async fn accept(&self, report: &HealthReport) -> Result<(), SinkError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(SinkError::Unavailable("injected failure".into()));
        }
        self.accepted
            .lock()
            .map_err(|_| SinkError::Unavailable("memory sink poisoned".into()))?
            .push(report.clone());
        Ok(())
    }
}
