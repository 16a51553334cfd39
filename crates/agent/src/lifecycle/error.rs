#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    AlreadyRunning(String),
    NotRunning(String),
}

impl std::fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyRunning(source) => write!(f, "monitor '{source}' is already running"),
            Self::NotRunning(source) => write!(f, "monitor '{source}' is not running"),
        }
    }
}

impl std::error::Error for LifecycleError {}
