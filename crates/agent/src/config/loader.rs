use std::path::Path;
use super::schema::AgentConfig;
use vigil_common::{normalize, EntityRef};

#[derive(Debug)]
pub enum LoadError {
    Io(std::io::Error),
    Parse(serde_yaml::Error),
    Validation(String),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Parse(e) => write!(f, "parse: {e}"),
            Self::Validation(msg) => write!(f, "validation: {msg}"),
        }
    }
}

impl std::error::Error for LoadError {}

impl From<std::io::Error> for LoadError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_yaml::Error> for LoadError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Parse(e)
    }
}

pub fn load_from_file(path: &Path) -> Result<AgentConfig, LoadError> {
    let contents = std::fs::read_to_string(path)?;
    load_from_str(&contents)
}

pub fn load_from_str(yaml: &str) -> Result<AgentConfig, LoadError> {
    let cfg: AgentConfig = serde_yaml::from_str(yaml)?;
    validate(&cfg)?;
    Ok(cfg)
}

fn validate(cfg: &AgentConfig) -> Result<(), LoadError> {
    if let Some(name) = cfg.node_name.as_deref().filter(|n| !n.trim().is_empty()) {
        normalize(&EntityRef::node(name))
            .map_err(|e| LoadError::Validation(format!("node_name: {e}")))?;
    }
    if cfg.default_ttl_seconds == 0 {
        return Err(LoadError::Validation("default_ttl_seconds must be > 0".into()));
    }
    if cfg.stop_timeout_seconds == 0 {
        return Err(LoadError::Validation("stop_timeout_seconds must be > 0".into()));
    }
    if cfg.sink.queue_capacity == 0 {
        return Err(LoadError::Validation("sink.queue_capacity must be > 0".into()));
    }

    for (name, monitor) in &cfg.monitors {
        if monitor.interval_seconds == 0 {
            return Err(LoadError::Validation(format!(
                "monitors.{name}.interval_seconds must be > 0"
            )));
        }
        if !(0.0..=1.0).contains(&monitor.jitter_fraction) {
            return Err(LoadError::Validation(format!(
                "monitors.{name}.jitter_fraction must be within [0, 1]"
            )));
        }
        if monitor.ttl_seconds == Some(0) {
            return Err(LoadError::Validation(format!(
                "monitors.{name}.ttl_seconds must be > 0"
            )));
        }
    }

    let disk = &cfg.disk;
    for (field, value) in [
        ("warning_percent", disk.warning_percent),
        ("error_percent", disk.error_percent),
    ] {
        if !(value > 0.0 && value <= 100.0) {
            return Err(LoadError::Validation(format!(
                "disk.{field} must be within (0, 100]"
            )));
        }
    }
    if disk.warning_percent >= disk.error_percent {
        return Err(LoadError::Validation(
            "disk.warning_percent must be below disk.error_percent".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_config() {
        let yaml = r#"
node_name: _Node_0
monitors:
  DiskObserver:
    interval_seconds: 30
disk:
  warning_percent: 70
  error_percent: 90
"#;
        let cfg = load_from_str(yaml).unwrap();
        assert_eq!(cfg.node_name.as_deref(), Some("_Node_0"));
        assert_eq!(cfg.monitors["DiskObserver"].interval_seconds, 30);
        assert_eq!(cfg.disk.warning_percent, 70.0);
    }

    #[test]
    fn zero_ttl_rejected() {
        let err = load_from_str("default_ttl_seconds: 0\n").unwrap_err();
        assert!(err.to_string().contains("default_ttl_seconds"));
    }

    #[test]
    fn zero_stop_timeout_rejected() {
        let err = load_from_str("stop_timeout_seconds: 0\n").unwrap_err();
        assert!(err.to_string().contains("stop_timeout_seconds"));
    }

    #[test]
    fn zero_interval_rejected() {
        let yaml = "monitors:\n  DiskObserver:\n    interval_seconds: 0\n";
        let err = load_from_str(yaml).unwrap_err();
        assert!(matches!(err, LoadError::Validation(_)));
        assert!(err.to_string().contains("DiskObserver.interval_seconds"));
    }

    #[test]
    fn jitter_out_of_range_rejected() {
        let yaml = "monitors:\n  DiskObserver:\n    jitter_fraction: 1.5\n";
        let err = load_from_str(yaml).unwrap_err();
        assert!(err.to_string().contains("jitter_fraction"));
    }

    #[test]
    fn zero_queue_capacity_rejected() {
        let err = load_from_str("sink:\n  queue_capacity: 0\n").unwrap_err();
        assert!(err.to_string().contains("queue_capacity"));
    }

    #[test]
    fn inverted_thresholds_rejected() {
        let yaml = "disk:\n  warning_percent: 95\n  error_percent: 90\n";
        let err = load_from_str(yaml).unwrap_err();
        assert!(err.to_string().contains("below"));

        let yaml = "disk:\n  warning_percent: 80\n  error_percent: 120\n";
        let err = load_from_str(yaml).unwrap_err();
        assert!(err.to_string().contains("error_percent"));
    }

    #[test]
    fn malformed_yaml_is_parse_error() {
        let err = load_from_str("api_port: [not a port").unwrap_err();
        assert!(matches!(err, LoadError::Parse(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_from_file(&dir.path().join("absent.yml")).unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
    }

    #[test]
    fn load_from_file_works() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vigil.yml");
        std::fs::write(&path, "node_name: n1\napi_port: 9300\n").unwrap();
        let cfg = load_from_file(&path).unwrap();
        assert_eq!(cfg.node_name.as_deref(), Some("n1"));
        assert_eq!(cfg.api_port, 9300);
    }

    #[test]
    fn node_name_with_separator_rejected() {
        let err = load_from_str("node_name: host/1\n").unwrap_err();
        assert!(matches!(err, LoadError::Validation(_)));
        assert!(err.to_string().contains("node_name"));

        assert!(load_from_str("node_name: 'host\\1'\n").is_err());
        assert!(load_from_str("node_name: _Node_0\n").is_ok());
    }
}
