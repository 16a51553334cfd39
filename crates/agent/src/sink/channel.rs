use vigil_common::HealthReport;

/// Destination for health reports, e.g. a cluster health subsystem.
/// Accepting a report for a tuple that already has one must replace it.
#[async_trait::async_trait]
pub trait ReportSink: Send + Sync {
    fn name(&self) -> &str;
    async fn accept(&self, report: &HealthReport) -> Result<(), SinkError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    Unavailable(String),
    Rejected(String),
}

impl std::fmt::Display for SinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(msg) => write!(f, "sink unavailable: {msg}"),
            Self::Rejected(msg) => write!(f, "sink rejected report: {msg}"),
        }
    }
}

impl std::error::Error for SinkError {}
