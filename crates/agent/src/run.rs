use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::api::{self, AgentState};
use crate::config::AgentConfig;
use crate::lifecycle::{MonitorController, MonitorSettings};
use crate::monitor::{DiskSpaceMonitor, Monitor};
use crate::reconciler::{Reconciler, ReconcilerSettings};
use crate::sink::{QueueSink, ReportSink, RetrySink, TracingSink};
use crate::store::ReportStore;
use vigil_common::retry::RetryConfig;

pub const DISK_OBSERVER: &str = "DiskObserver";

const FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn run(config: AgentConfig) -> Result<(), Box<dyn std::error::Error>> {
    let node_name = config.resolve_node_name();

    tracing::info!(
        node_name = %node_name,
        default_ttl_s = config.default_ttl_seconds,
        stop_timeout_s = config.stop_timeout_seconds,
        monitors = config.monitors.len(),
        "agent configured"
    );

    let (queue, forwarder) = build_sink(&config);
    let state = AgentState::new(ReportStore::new());
    let reconciler = Arc::new(Reconciler::new(
        Arc::new(queue.clone()),
        ReconcilerSettings {
            node_name,
            default_ttl: config.default_ttl(),
        },
        state.clone(),
    ));
    let controller = MonitorController::new(reconciler, config.stop_timeout());

    let started = controller.start_configured(monitors(&config))?;
    if started.is_empty() {
        tracing::warn!("no monitors enabled");
    }

    spawn_api(config.api_port, state).await;

    tracing::info!(monitors = ?started, "agent running");
    if let Err(e) = crate::shutdown::wait_for_shutdown().await {
        tracing::error!(error = %e, "signal handler failed, shutting down");
    }

    tracing::info!("shutting down");
    let stopped = controller.stop_all().await;
    if !queue.flush(FLUSH_TIMEOUT).await {
        tracing::warn!(pending = queue.in_flight(), "report queue not drained before exit");
    }
    forwarder.abort();

    tracing::info!(stopped, "agent stopped");
    Ok(())
}

/// Tracing sink behind retries, fed through a bounded queue.
fn build_sink(config: &AgentConfig) -> (QueueSink, JoinHandle<()>) {
    let retry = RetryConfig {
        max_attempts: config.sink.max_retries.saturating_add(1),
        initial_delay: Duration::from_millis(config.sink.base_delay_ms),
        ..RetryConfig::default()
    };
    let downstream: Arc<dyn ReportSink> = Arc::new(RetrySink::new(TracingSink, retry));
    QueueSink::spawn(downstream, config.sink.queue_capacity)
}

fn monitors(config: &AgentConfig) -> Vec<(Arc<dyn Monitor>, MonitorSettings)> {
    let disk: Arc<dyn Monitor> = Arc::new(DiskSpaceMonitor::new(
        DISK_OBSERVER,
        config.disk_thresholds(),
    ));
    vec![(disk, config.monitor_settings(DISK_OBSERVER))]
}

async fn spawn_api(port: u16, state: AgentState) {
    let addr = format!("0.0.0.0:{port}");
    tokio::spawn(async move {
        match TcpListener::bind(&addr).await {
            Ok(listener) => {
                tracing::info!(addr = %addr, "HTTP API listening");
                if let Err(e) = api::serve(listener, state).await {
                    tracing::error!(error = %e, "HTTP API error");
                }
            }
            Err(e) => tracing::error!(error = %e, addr = %addr, "failed to bind HTTP API"),
        }
    });
}
