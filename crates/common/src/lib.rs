pub mod entity;
pub mod fingerprint;
pub mod report;
pub mod retry;

pub use entity::{normalize, EntityKind, EntityRef, InvalidEntityError, InvalidReason};
pub use report::{now_ms, HealthReport, HealthState, ReportKey};
