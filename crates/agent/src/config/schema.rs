use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::lifecycle::MonitorSettings;
use crate::monitor::DiskThresholds;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AgentConfig {
    #[serde(default)]
    pub node_name: Option<String>,
    #[serde(default = "default_ttl_seconds")]
    pub default_ttl_seconds: u64,
    #[serde(default = "default_stop_timeout_seconds")]
    pub stop_timeout_seconds: u64,
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    #[serde(default)]
    pub sink: SinkConfig,
    #[serde(default)]
    pub monitors: BTreeMap<String, MonitorConfig>,
    #[serde(default)]
    pub disk: DiskConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SinkConfig {
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MonitorConfig {
    #[serde(default = "yes")]
    pub enabled: bool,
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,
    #[serde(default = "default_jitter_fraction")]
    pub jitter_fraction: f64,
    #[serde(default)]
    pub ttl_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DiskConfig {
    #[serde(default = "default_warning_percent")]
    pub warning_percent: f64,
    #[serde(default = "default_error_percent")]
    pub error_percent: f64,
}

impl AgentConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_seconds)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_seconds)
    }

    /// Configured node name, else the host name, else `"unknown"`.
    pub fn resolve_node_name(&self) -> String {
        self.node_name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .or_else(sysinfo::System::host_name)
            .unwrap_or_else(|| "unknown".into())
    }

    /// Loop settings for `source_id`. Sources with no entry run with the
    /// defaults.
    pub fn monitor_settings(&self, source_id: &str) -> MonitorSettings {
        let monitor = self.monitors.get(source_id).cloned().unwrap_or_default();
        MonitorSettings {
            enabled: monitor.enabled,
            interval: Duration::from_secs(monitor.interval_seconds),
            jitter_fraction: monitor.jitter_fraction,
            ttl: monitor.ttl_seconds.map(Duration::from_secs),
        }
    }

    pub fn disk_thresholds(&self) -> DiskThresholds {
        DiskThresholds {
            warning_percent: self.disk.warning_percent,
            error_percent: self.disk.error_percent,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            node_name: None,
            default_ttl_seconds: default_ttl_seconds(),
            stop_timeout_seconds: default_stop_timeout_seconds(),
            api_port: default_api_port(),
            sink: SinkConfig::default(),
            monitors: BTreeMap::new(),
            disk: DiskConfig::default(),
        }
    }
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: default_interval_seconds(),
            jitter_fraction: default_jitter_fraction(),
            ttl_seconds: None,
        }
    }
}

impl Default for DiskConfig {
    fn default() -> Self {
        Self {
            warning_percent: default_warning_percent(),
            error_percent: default_error_percent(),
        }
    }
}

fn default_ttl_seconds() -> u64 {
    300
}

fn default_stop_timeout_seconds() -> u64 {
    30
}

fn default_api_port() -> u16 {
    9100
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    200
}

fn default_interval_seconds() -> u64 {
    60
}

fn default_jitter_fraction() -> f64 {
    0.1
}

fn default_warning_percent() -> f64 {
    85.0
}

fn default_error_percent() -> f64 {
    95.0
}

fn yes() -> bool {
    true
}
