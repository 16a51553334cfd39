use std::sync::{Arc, Mutex};
use std::time::Duration;

use vigil_agent::api::AgentState;
use vigil_agent::lifecycle::{LifecycleError, MonitorController, MonitorSettings, MonitorState};
use vigil_agent::monitor::{
    DiskSampler, DiskSpaceMonitor, DiskThresholds, DiskUsage, MonitorError, DISK_SPACE_PROPERTY,
};
use vigil_agent::reconciler::{Observation, Outcome, Reconciler, ReconcilerSettings};
use vigil_agent::sink::MemorySink;
use vigil_agent::store::ReportStore;
use vigil_common::{EntityRef, HealthState, ReportKey};

struct StaticDisks(Mutex<Vec<DiskUsage>>);

impl DiskSampler for StaticDisks {
    fn sample(&self) -> Result<Vec<DiskUsage>, MonitorError> {
        Ok(self.0.lock().unwrap().clone())
    }
}

fn disk(mount: &str, used_percent: u64) -> DiskUsage {
    DiskUsage {
        mount_point: mount.into(),
        total_bytes: 1000,
        available_bytes: 1000 - used_percent * 10,
    }
}

fn reconciler() -> (Arc<Reconciler>, MemorySink) {
    let sink = MemorySink::new();
    let rec = Reconciler::new(
        Arc::new(sink.clone()),
        ReconcilerSettings {
            node_name: "_Node_0".into(),
            default_ttl: Duration::from_secs(300),
        },
        AgentState::new(ReportStore::new()),
    );
    (Arc::new(rec), sink)
}

fn fast() -> MonitorSettings {
    MonitorSettings {
        interval: Duration::from_millis(20),
        jitter_fraction: 0.0,
        ..Default::default()
    }
}

async fn wait_until<F: Fn() -> bool>(cond: F) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached");
}

#[tokio::test]
async fn disk_observer_warning_is_cleared_on_stop() {
    let (rec, sink) = reconciler();
    let sampler = Arc::new(StaticDisks(Mutex::new(vec![disk("C:\\", 90)])));
    let monitor = Arc::new(DiskSpaceMonitor::with_sampler(
        "DiskObserver",
        DiskThresholds::default(),
        sampler,
    ));
    let controller = MonitorController::new(rec.clone(), Duration::from_secs(5));
    let key = ReportKey::new(EntityRef::disk("C:"), "DiskObserver", DISK_SPACE_PROPERTY);

    controller.start(monitor, fast()).unwrap();
    assert_eq!(controller.state("DiskObserver"), MonitorState::Running);

    let store = rec.store().clone();
    wait_until(|| store.get_key(&key).is_some()).await;
    let raised = store.get_key(&key).unwrap();
    assert_eq!(raised.state, HealthState::Warning);

    let cleared = controller.stop("DiskObserver").await.unwrap();

    assert!(store.is_empty());
    assert_eq!(cleared.len(), 1);
    assert_eq!(cleared[0].report_id, raised.report_id);
    assert_eq!(sink.clears_for(&key), 1);
    let last = sink.accepted_for(&key).pop().unwrap();
    assert_eq!(last.state, HealthState::Ok);
    assert!(last.emit_ok);
}

#[tokio::test]
async fn three_warning_passes_leave_one_report() {
    let (rec, sink) = reconciler();
    let entity = EntityRef::application("fabric:/App1");
    let key = ReportKey::new(entity.clone(), "AppObserver", "MemoryMB");

    for now in [1_000, 2_000, 3_000] {
        let outcome = rec
            .evaluate(
                Observation::warning(entity.clone(), "AppObserver", "MemoryMB", "MemoryWarn"),
                now,
            )
            .await
            .unwrap();
        let expected = if now == 1_000 { Outcome::Raised } else { Outcome::Refreshed };
        assert_eq!(outcome, expected);
    }

    assert_eq!(rec.store().len(), 1);
    let stored = rec.store().get_key(&key).unwrap();
    assert_eq!(stored.created_at_ms, 1_000);
    assert_eq!(stored.last_refreshed_at_ms, 3_000);
    assert_eq!(sink.accepted_for(&key).len(), 3);
}

#[tokio::test]
async fn ok_without_prior_report_is_silent() {
    let (rec, sink) = reconciler();
    let outcome = rec
        .evaluate(
            Observation::ok(EntityRef::node("_Node_1"), "NodeObserver", "CpuPercent"),
            1_000,
        )
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Unchanged);
    assert!(rec.store().is_empty());
    assert_eq!(sink.attempts(), 0);
}

#[tokio::test]
async fn lifecycle_exclusivity() {
    let (rec, _sink) = reconciler();
    let sampler = Arc::new(StaticDisks(Mutex::new(vec![disk("/", 10)])));
    let monitor = Arc::new(DiskSpaceMonitor::with_sampler(
        "DiskObserver",
        DiskThresholds::default(),
        sampler,
    ));
    let controller = MonitorController::new(rec, Duration::from_secs(5));

    assert_eq!(
        controller.stop("DiskObserver").await.unwrap_err(),
        LifecycleError::NotRunning("DiskObserver".into())
    );
    controller.start(monitor.clone(), fast()).unwrap();
    assert_eq!(
        controller.start(monitor.clone(), fast()).unwrap_err(),
        LifecycleError::AlreadyRunning("DiskObserver".into())
    );
    assert!(controller.is_running("DiskObserver"));

    controller.stop("DiskObserver").await.unwrap();
    assert!(!controller.is_running("DiskObserver"));
    assert!(matches!(
        controller.stop("DiskObserver").await,
        Err(LifecycleError::NotRunning(_))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_evaluations_keep_the_newest() {
    let (rec, _sink) = reconciler();
    let entity = EntityRef::service("fabric:/App1/Svc1");
    let key = ReportKey::new(entity.clone(), "AppObserver", "CpuPercent");

    // Interleave timestamps so older passes routinely land after newer ones.
    let stamps: Vec<i64> = (1..=64).map(|i| if i % 2 == 0 { i } else { 65 - i }).collect();
    let tasks: Vec<_> = stamps
        .into_iter()
        .map(|now| {
            let rec = rec.clone();
            let entity = entity.clone();
            tokio::spawn(async move {
                let state = if now % 3 == 0 {
                    Observation::error(entity, "AppObserver", "CpuPercent", "CpuError")
                } else {
                    Observation::warning(entity, "AppObserver", "CpuPercent", "CpuWarn")
                };
                rec.evaluate(state.with_message(format!("pass {now}")), now)
                    .await
                    .unwrap()
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap();
    }

    let stored = rec.store().get_key(&key).unwrap();
    assert_eq!(stored.last_refreshed_at_ms, 64);
    assert_eq!(stored.message, "pass 64");
    assert_eq!(rec.store().len(), 1);
}

#[tokio::test]
async fn stop_only_clears_the_stopped_source() {
    let (rec, sink) = reconciler();
    let controller = MonitorController::new(rec.clone(), Duration::from_secs(5));
    let node = EntityRef::node("_Node_0");

    rec.evaluate(
        Observation::warning(node.clone(), "NodeObserver", "CpuPercent", "CpuWarn"),
        1_000,
    )
    .await
    .unwrap();

    let sampler = Arc::new(StaticDisks(Mutex::new(vec![disk("/", 99)])));
    let monitor = Arc::new(DiskSpaceMonitor::with_sampler(
        "DiskObserver",
        DiskThresholds::default(),
        sampler,
    ));
    controller.start(monitor, fast()).unwrap();
    let store = rec.store().clone();
    wait_until(|| !store.owned_by("DiskObserver").is_empty()).await;

    controller.stop("DiskObserver").await.unwrap();

    assert!(store.owned_by("DiskObserver").is_empty());
    let other = ReportKey::new(node, "NodeObserver", "CpuPercent");
    assert!(store.get_key(&other).is_some());
    assert_eq!(sink.clears_for(&other), 0);
}
