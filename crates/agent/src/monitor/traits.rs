use super::context::PassContext;
use vigil_common::InvalidEntityError;

/// A periodic evaluator of one resource dimension. `source_id` must be
/// stable across passes; it scopes the reports the monitor owns.
#[async_trait::async_trait]
pub trait Monitor: Send + Sync {
    fn source_id(&self) -> &str;
    async fn run_pass(&self, ctx: PassContext) -> Result<(), MonitorError>;
}

#[derive(Debug)]
pub enum MonitorError {
    Sample(String),
    InvalidEntity(InvalidEntityError),
}

impl std::fmt::Display for MonitorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sample(msg) => write!(f, "sampling failed: {msg}"),
            Self::InvalidEntity(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for MonitorError {}

impl From<InvalidEntityError> for MonitorError {
    fn from(e: InvalidEntityError) -> Self {
        Self::InvalidEntity(e)
    }
}
