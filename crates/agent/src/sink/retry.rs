use std::sync::Mutex;

use super::channel::{ReportSink, SinkError};
use vigil_common::retry::{retry_async, RetryConfig};
use vigil_common::HealthReport;

/// Retries transient failures of the inner sink with exponential backoff.
/// `Rejected` is final and returned immediately.
pub struct RetrySink<S: ReportSink> {
    inner: S,
    config: RetryConfig,
}

impl<S: ReportSink> RetrySink<S> {
    pub fn new(inner: S, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait::async_trait]
impl<S: ReportSink> ReportSink for RetrySink<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn accept(&self, report: &HealthReport) -> Result<(), SinkError> {
        let rejected = Mutex::new(None);
        let result = retry_async(&self.config, self.inner.name(), || async {
            match self.inner.accept(report).await {
                Err(SinkError::Rejected(msg)) => {
                    if let Ok(mut slot) = rejected.lock() {
                        *slot = Some(msg);
                    }
                    Ok(())
                }
                other => other,
            }
        })
        .await;

        if let Some(msg) = rejected.into_inner().ok().flatten() {
            return Err(SinkError::Rejected(msg));
        }
        if let Err(ref e) = result {
            tracing::error!(
                sink = self.inner.name(),
                fingerprint = %report.key().fingerprint(),
                attempts = self.config.max_attempts,
                error = %e,
                "giving up on report delivery"
            );
        }
        result
    }
}
