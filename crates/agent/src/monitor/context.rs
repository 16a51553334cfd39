use std::sync::Arc;
use std::time::Duration;

use crate::reconciler::{Observation, Outcome, Reconciler};
use crate::store::OwnedTuple;
use vigil_common::{EntityRef, HealthState, InvalidEntityError};

/// Handle a monitor uses during one pass. Bound to the monitor's source and
/// the pass timestamp; clone it to evaluate tuples concurrently.
#[derive(Clone)]
pub struct PassContext {
    reconciler: Arc<Reconciler>,
    source_id: Arc<str>,
    now_ms: i64,
    ttl: Option<Duration>,
}

impl PassContext {
    pub fn new(
        reconciler: Arc<Reconciler>,
        source_id: &str,
        now_ms: i64,
        ttl: Option<Duration>,
    ) -> Self {
        Self {
            reconciler,
            source_id: Arc::from(source_id),
            now_ms,
            ttl,
        }
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Tuples this source currently has active.
    pub fn owned(&self) -> Vec<OwnedTuple> {
        self.reconciler.store().owned_by(&self.source_id)
    }

    pub async fn evaluate(
        &self,
        entity: EntityRef,
        property: &str,
        state: HealthState,
        code: Option<&str>,
        message: impl Into<String>,
    ) -> Result<Outcome, InvalidEntityError> {
        let mut observation = Observation::new(entity, &*self.source_id, property, state)
            .with_message(message);
        if let Some(code) = code {
            observation = observation.with_code(code);
        }
        if let Some(ttl) = self.ttl {
            observation = observation.with_ttl(ttl);
        }
        self.reconciler.evaluate(observation, self.now_ms).await
    }

    pub async fn ok(
        &self,
        entity: EntityRef,
        property: &str,
        message: impl Into<String>,
    ) -> Result<Outcome, InvalidEntityError> {
        self.evaluate(entity, property, HealthState::Ok, None, message)
            .await
    }

    pub async fn warning(
        &self,
        entity: EntityRef,
        property: &str,
        code: &str,
        message: impl Into<String>,
    ) -> Result<Outcome, InvalidEntityError> {
        self.evaluate(entity, property, HealthState::Warning, Some(code), message)
            .await
    }

    pub async fn error(
        &self,
        entity: EntityRef,
        property: &str,
        code: &str,
        message: impl Into<String>,
    ) -> Result<Outcome, InvalidEntityError> {
        self.evaluate(entity, property, HealthState::Error, Some(code), message)
            .await
    }
}
