use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::entity::EntityRef;
use crate::fingerprint::fingerprint_string;

/// Code attached to Warning/Error reports raised without one.
pub const UNSPECIFIED_CODE: &str = "Unspecified";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HealthState {
    Ok,
    Warning,
    Error,
}

impl HealthState {
    pub fn is_unhealthy(&self) -> bool {
        !matches!(self, Self::Ok)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Address of one logical report: (entity, source, property).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReportKey {
    pub entity: EntityRef,
    pub source_id: String,
    pub property: String,
}

impl ReportKey {
    pub fn new(entity: EntityRef, source_id: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            entity,
            source_id: source_id.into(),
            property: property.into(),
        }
    }

    pub fn fingerprint(&self) -> String {
        fingerprint_string(&self.entity, &self.source_id, &self.property)
    }
}

impl fmt::Display for ReportKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.entity, self.source_id, self.property)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub report_id: String,
    pub entity: EntityRef,
    pub source_id: String,
    pub property: String,
    pub state: HealthState,
    pub code: Option<String>,
    pub message: String,
    #[serde(with = "duration_secs")]
    pub time_to_live: Duration,
    pub created_at_ms: i64,
    pub last_refreshed_at_ms: i64,
    /// Set on Ok reports that clear an earlier Warning/Error.
    pub emit_ok: bool,
}

impl HealthReport {
    pub fn key(&self) -> ReportKey {
        ReportKey::new(self.entity.clone(), self.source_id.clone(), self.property.clone())
    }

    pub fn is_active(&self) -> bool {
        self.state.is_unhealthy()
    }

    /// The Ok report that retires this one, keeping its id for correlation.
    pub fn clearing(&self, message: impl Into<String>, now_ms: i64) -> HealthReport {
        HealthReport {
            report_id: self.report_id.clone(),
            entity: self.entity.clone(),
            source_id: self.source_id.clone(),
            property: self.property.clone(),
            state: HealthState::Ok,
            code: None,
            message: message.into(),
            time_to_live: self.time_to_live,
            created_at_ms: self.created_at_ms,
            last_refreshed_at_ms: now_ms,
            emit_ok: true,
        }
    }
}

pub fn new_report_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Ok(Duration::from_secs_f64(secs.max(0.0)))
    }
}
