use super::channel::{ReportSink, SinkError};
use vigil_common::{HealthReport, HealthState};

/// Publishes reports as structured log events.
#[derive(Debug, Default, Clone)]
pub struct TracingSink;

#[async_trait::async_trait]
impl ReportSink for TracingSink {
    fn name(&self) -> &str {
        "tracing"
    }

    async fn accept(&self, report: &HealthReport) -> Result<(), SinkError> {
        let code = report.code.as_deref().unwrap_or("");
        let ttl_s = report.time_to_live.as_secs();
        match report.state {
            HealthState::Ok => tracing::info!(
                report_id = %report.report_id,
                entity = %report.entity,
                source_id = %report.source_id,
                property = %report.property,
                emit_ok = report.emit_ok,
                "health ok: {}",
                report.message
            ),
            HealthState::Warning => tracing::warn!(
                report_id = %report.report_id,
                entity = %report.entity,
                source_id = %report.source_id,
                property = %report.property,
                code,
                ttl_s,
                "health warning: {}",
                report.message
            ),
            HealthState::Error => tracing::error!(
                report_id = %report.report_id,
                entity = %report.entity,
                source_id = %report.source_id,
                property = %report.property,
                code,
                ttl_s,
                "health error: {}",
                report.message
            ),
        }
        Ok(())
    }
}
