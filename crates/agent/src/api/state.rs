use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::store::ReportStore;

/// Counters shared by the reconciler, the monitor loops and the HTTP API.
#[derive(Debug, Clone)]
pub struct AgentState {
    inner: Arc<Inner>,
    store: ReportStore,
}

#[derive(Debug, Default)]
struct Inner {
    sink_sends: AtomicU64,
    sink_failures: AtomicU64,
    reports_cleared: AtomicU64,
    pass_failures: AtomicU64,
    monitors_running: AtomicU64,
}

impl AgentState {
    pub fn new(store: ReportStore) -> Self {
        Self {
            inner: Arc::new(Inner::default()),
            store,
        }
    }

    pub fn store(&self) -> &ReportStore {
        &self.store
    }

    pub fn reports_active(&self) -> u64 {
        self.store.list_active(|_| true).count() as u64
    }

    pub fn increment_sink_sends(&self) {
        self.inner.sink_sends.fetch_add(1, Ordering::Relaxed);
    }

    pub fn sink_sends(&self) -> u64 {
        self.inner.sink_sends.load(Ordering::Relaxed)
    }

    pub fn increment_sink_failures(&self) {
        self.inner.sink_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn sink_failures(&self) -> u64 {
        self.inner.sink_failures.load(Ordering::Relaxed)
    }

    pub fn increment_reports_cleared(&self) {
        self.inner.reports_cleared.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reports_cleared(&self) -> u64 {
        self.inner.reports_cleared.load(Ordering::Relaxed)
    }

    pub fn increment_pass_failures(&self) {
        self.inner.pass_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn pass_failures(&self) -> u64 {
        self.inner.pass_failures.load(Ordering::Relaxed)
    }

    pub fn set_monitors_running(&self, v: u64) {
        self.inner.monitors_running.store(v, Ordering::Relaxed);
    }

    pub fn monitors_running(&self) -> u64 {
        self.inner.monitors_running.load(Ordering::Relaxed)
    }

    pub fn is_ready(&self) -> bool {
        self.monitors_running() > 0
    }
}
