use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::error::LifecycleError;
use super::state::{MonitorRegistration, MonitorSettings, MonitorState};
use crate::monitor::Monitor;
use crate::reconciler::Reconciler;
use crate::scheduler::MonitorTask;
use vigil_common::{now_ms, HealthReport};

struct Registration {
    state: MonitorState,
    shutdown: Option<watch::Sender<bool>>,
    handle: Option<JoinHandle<()>>,
}

/// Owns the start/stop state of a set of monitors. Stopping a monitor
/// always clears every report it raised.
pub struct MonitorController {
    reconciler: Arc<Reconciler>,
    registry: DashMap<String, Registration>,
    stop_timeout: Duration,
}

impl MonitorController {
    pub fn new(reconciler: Arc<Reconciler>, stop_timeout: Duration) -> Self {
        Self {
            reconciler,
            registry: DashMap::new(),
            stop_timeout,
        }
    }

    pub fn reconciler(&self) -> &Arc<Reconciler> {
        &self.reconciler
    }

    /// Must be called from within a tokio runtime.
    pub fn start(
        &self,
        monitor: Arc<dyn Monitor>,
        settings: MonitorSettings,
    ) -> Result<(), LifecycleError> {
        let source_id = monitor.source_id().to_string();

        match self.registry.entry(source_id.clone()) {
            Entry::Occupied(mut slot) => {
                if slot.get().state != MonitorState::Stopped {
                    return Err(LifecycleError::AlreadyRunning(source_id));
                }
                slot.get_mut().state = MonitorState::Starting;
            }
            Entry::Vacant(slot) => {
                slot.insert(Registration {
                    state: MonitorState::Starting,
                    shutdown: None,
                    handle: None,
                });
            }
        }

        self.reconciler.open_source(&source_id);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = MonitorTask {
            monitor,
            reconciler: self.reconciler.clone(),
            interval: settings.interval,
            jitter_fraction: settings.jitter_fraction,
            ttl: settings.ttl,
        }
        .spawn(shutdown_rx);

        if let Some(mut reg) = self.registry.get_mut(&source_id) {
            reg.state = MonitorState::Running;
            reg.shutdown = Some(shutdown_tx);
            reg.handle = Some(handle);
        }
        self.publish_running();

        tracing::info!(source_id = %source_id, "monitor started");
        Ok(())
    }

    /// Starts every enabled monitor. Disabled ones are skipped; returns the
    /// sources that were started.
    pub fn start_configured(
        &self,
        monitors: Vec<(Arc<dyn Monitor>, MonitorSettings)>,
    ) -> Result<Vec<String>, LifecycleError> {
        let mut started = Vec::new();
        for (monitor, settings) in monitors {
            let source_id = monitor.source_id().to_string();
            if !settings.enabled {
                tracing::info!(source_id = %source_id, "monitor disabled, not starting");
                continue;
            }
            self.start(monitor, settings)?;
            started.push(source_id);
        }
        Ok(started)
    }

    /// Cancels the monitor's loop, waits up to the stop timeout for it to
    /// finish its current pass, then clears all of its reports. Returns the
    /// Ok reports sent to the sink. A pass that outlives the timeout can no
    /// longer write once this returns.
    pub async fn stop(&self, source_id: &str) -> Result<Vec<HealthReport>, LifecycleError> {
        let (shutdown, handle) = {
            let mut reg = self
                .registry
                .get_mut(source_id)
                .ok_or_else(|| LifecycleError::NotRunning(source_id.to_string()))?;
            if reg.state != MonitorState::Running {
                return Err(LifecycleError::NotRunning(source_id.to_string()));
            }
            reg.state = MonitorState::Stopping;
            (reg.shutdown.take(), reg.handle.take())
        };

        tracing::info!(source_id, "stopping monitor");
        if let Some(tx) = shutdown {
            let _ = tx.send(true);
        }

        if let Some(mut handle) = handle {
            match tokio::time::timeout(self.stop_timeout, &mut handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(source_id, error = %e, "monitor loop ended abnormally"),
                Err(_) => {
                    tracing::error!(
                        source_id,
                        timeout_s = self.stop_timeout.as_secs_f64(),
                        "monitor loop did not exit in time, aborting"
                    );
                    handle.abort();
                }
            }
        }

        let cleared = self.reconciler.clear_source(source_id, now_ms()).await;

        if let Some(mut reg) = self.registry.get_mut(source_id) {
            reg.state = MonitorState::Stopped;
        }
        self.publish_running();

        tracing::info!(source_id, cleared = cleared.len(), "monitor stopped");
        Ok(cleared)
    }

    /// Stops every running monitor concurrently. Returns how many stopped.
    pub async fn stop_all(&self) -> usize {
        let running = self.running_sources();
        let results = join_all(running.iter().map(|source| self.stop(source))).await;
        results.iter().filter(|r| r.is_ok()).count()
    }

    pub fn is_running(&self, source_id: &str) -> bool {
        self.state(source_id).is_running()
    }

    pub fn state(&self, source_id: &str) -> MonitorState {
        self.registry
            .get(source_id)
            .map(|reg| reg.state)
            .unwrap_or(MonitorState::Stopped)
    }

    pub fn registration(&self, source_id: &str) -> Option<MonitorRegistration> {
        let state = self.registry.get(source_id).map(|reg| reg.state)?;
        Some(MonitorRegistration {
            source_id: source_id.to_string(),
            state,
            is_running: state.is_running(),
            owned_tuples: self.reconciler.store().owned_by(source_id),
        })
    }

    pub fn running_sources(&self) -> Vec<String> {
        let mut sources: Vec<String> = self
            .registry
            .iter()
            .filter(|e| e.value().state == MonitorState::Running)
            .map(|e| e.key().clone())
            .collect();
        sources.sort();
        sources
    }

    fn publish_running(&self) {
        let running = self
            .registry
            .iter()
            .filter(|e| e.value().state.is_running())
            .count();
        self.reconciler.state().set_monitors_running(running as u64);
    }
}
