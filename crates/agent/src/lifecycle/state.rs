use serde::Serialize;
use std::time::Duration;

use crate::store::OwnedTuple;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MonitorState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

impl MonitorState {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running | Self::Stopping)
    }
}

/// How a monitor's loop is driven.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSettings {
    pub enabled: bool,
    pub interval: Duration,
    pub jitter_fraction: f64,
    /// Overrides the reconciler's default time-to-live for this source.
    pub ttl: Option<Duration>,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(60),
            jitter_fraction: 0.1,
            ttl: None,
        }
    }
}

/// Snapshot of one monitor's registration.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorRegistration {
    pub source_id: String,
    pub state: MonitorState,
    pub is_running: bool,
    pub owned_tuples: Vec<OwnedTuple>,
}
