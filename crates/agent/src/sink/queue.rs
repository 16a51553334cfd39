use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::channel::{ReportSink, SinkError};
use vigil_common::HealthReport;

/// Hands reports to a background forwarder so monitor passes never wait on
/// the downstream sink.
#[derive(Clone)]
pub struct QueueSink {
    tx: mpsc::Sender<HealthReport>,
    in_flight: Arc<AtomicUsize>,
    name: String,
}

impl QueueSink {
    pub fn spawn(inner: Arc<dyn ReportSink>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<HealthReport>(capacity.max(1));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let name = format!("queue({})", inner.name());

        let counter = in_flight.clone();
        let handle = tokio::spawn(async move {
            while let Some(report) = rx.recv().await {
                if let Err(e) = inner.accept(&report).await {
                    tracing::warn!(
                        sink = inner.name(),
                        fingerprint = %report.key().fingerprint(),
                        state = %report.state,
                        error = %e,
                        "queued report dropped"
                    );
                }
                counter.fetch_sub(1, Ordering::SeqCst);
            }
            tracing::debug!(sink = inner.name(), "report queue closed");
        });

        (Self { tx, in_flight, name }, handle)
    }

    /// Reports queued or being delivered.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Waits until every queued report has been handed to the inner sink.
    /// Returns false if `timeout` elapsed first.
    pub async fn flush(&self, timeout: Duration) -> bool {
        let drained = async {
            while self.in_flight() > 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        };
        tokio::time::timeout(timeout, drained).await.is_ok()
    }
}

#[async_trait::async_trait]
impl ReportSink for QueueSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn accept(&self, report: &HealthReport) -> Result<(), SinkError> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        match self.tx.try_send(report.clone()) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                match e {
                    mpsc::error::TrySendError::Full(_) => {
                        Err(SinkError::Unavailable("report queue full".into()))
                    }
                    mpsc::error::TrySendError::Closed(_) => {
                        Err(SinkError::Unavailable("report forwarder stopped".into()))
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use vigil_common::{EntityRef, HealthState};

    fn sample(n: i64) -> HealthReport {
        HealthReport {
            report_id: format!("r-{n}"),
            entity: EntityRef::node("n1"),
            source_id: "NodeObserver".into(),
            property: format!("P{n}"),
            state: HealthState::Warning,
            code: Some("W".into()),
            message: String::new(),
            time_to_live: Duration::from_secs(60),
            created_at_ms: n,
            last_refreshed_at_ms: n,
            emit_ok: false,
        }
    }

    #[tokio::test]
    async fn forwards_to_inner_sink() {
        let memory = MemorySink::new();
        let (queue, _handle) = QueueSink::spawn(Arc::new(memory.clone()), 8);

        for n in 0..3 {
            queue.accept(&sample(n)).await.unwrap();
        }
        assert!(queue.flush(Duration::from_secs(2)).await);
        assert_eq!(memory.accepted_count(), 3);
        assert_eq!(queue.in_flight(), 0);
    }

    #[tokio::test]
    async fn inner_failure_does_not_stop_forwarder() {
        let memory = MemorySink::new();
        memory.fail_next(1);
        let (queue, _handle) = QueueSink::spawn(Arc::new(memory.clone()), 8);

        queue.accept(&sample(1)).await.unwrap();
        queue.accept(&sample(2)).await.unwrap();
        assert!(queue.flush(Duration::from_secs(2)).await);
        assert_eq!(memory.accepted_count(), 1);
        assert_eq!(memory.accepted()[0].property, "P2");
    }

    #[tokio::test]
    async fn closed_forwarder_reports_unavailable() {
        let memory = MemorySink::new();
        let (queue, handle) = QueueSink::spawn(Arc::new(memory), 1);
        handle.abort();
        let _ = handle.await;

        let err = queue.accept(&sample(1)).await.unwrap_err();
        assert!(matches!(err, SinkError::Unavailable(_)));
        assert_eq!(queue.in_flight(), 0);
    }
}
