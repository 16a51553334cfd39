use std::time::Duration;

use vigil_common::{EntityRef, HealthState};

/// One monitor's verdict on one property of one entity during a pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub entity: EntityRef,
    pub source_id: String,
    pub property: String,
    pub state: HealthState,
    pub code: Option<String>,
    pub message: String,
    pub ttl: Option<Duration>,
}

impl Observation {
    pub fn new(
        entity: EntityRef,
        source_id: impl Into<String>,
        property: impl Into<String>,
        state: HealthState,
    ) -> Self {
        Self {
            entity,
            source_id: source_id.into(),
            property: property.into(),
            state,
            code: None,
            message: String::new(),
            ttl: None,
        }
    }

    pub fn ok(entity: EntityRef, source_id: impl Into<String>, property: impl Into<String>) -> Self {
        Self::new(entity, source_id, property, HealthState::Ok)
    }

    pub fn warning(
        entity: EntityRef,
        source_id: impl Into<String>,
        property: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self::new(entity, source_id, property, HealthState::Warning).with_code(code)
    }

    pub fn error(
        entity: EntityRef,
        source_id: impl Into<String>,
        property: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self::new(entity, source_id, property, HealthState::Error).with_code(code)
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}
