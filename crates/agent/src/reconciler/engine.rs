use dashmap::DashSet;
use std::sync::Arc;
use std::time::Duration;

use super::observation::Observation;
use super::outcome::Outcome;
use crate::api::AgentState;
use crate::sink::ReportSink;
use crate::store::{ReportStore, Transition};
use vigil_common::report::{new_report_id, UNSPECIFIED_CODE};
use vigil_common::{normalize, EntityRef, HealthReport, HealthState, InvalidEntityError, ReportKey};

pub const MONITOR_HEALTH_PROPERTY: &str = "MonitorHealth";
pub const MONITOR_FAILURE_CODE: &str = "MonitorPassFailed";

#[derive(Debug, Clone)]
pub struct ReconcilerSettings {
    /// Node that monitor self-reports are filed against.
    pub node_name: String,
    pub default_ttl: Duration,
}

impl Default for ReconcilerSettings {
    fn default() -> Self {
        Self {
            node_name: "unknown".into(),
            default_ttl: Duration::from_secs(300),
        }
    }
}

pub struct Reconciler {
    store: ReportStore,
    sink: Arc<dyn ReportSink>,
    settings: ReconcilerSettings,
    state: AgentState,
    closed: DashSet<String>,
}

impl Reconciler {
    pub fn new(sink: Arc<dyn ReportSink>, settings: ReconcilerSettings, state: AgentState) -> Self {
        Self {
            store: state.store().clone(),
            sink,
            settings,
            state,
            closed: DashSet::new(),
        }
    }

    /// Accepts evaluations from `source_id` again after a
    /// [`Reconciler::clear_source`].
    pub fn open_source(&self, source_id: &str) {
        self.closed.remove(source_id);
    }

    pub fn is_closed(&self, source_id: &str) -> bool {
        self.closed.contains(source_id)
    }

    pub fn store(&self) -> &ReportStore {
        &self.store
    }

    pub fn settings(&self) -> &ReconcilerSettings {
        &self.settings
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    /// Applies one observation to its tuple and notifies the sink when the
    /// tuple is (still) unhealthy or was just cleared. Only a malformed
    /// entity is an error; sink failures are logged and absorbed.
    pub async fn evaluate(
        &self,
        observation: Observation,
        now_ms: i64,
    ) -> Result<Outcome, InvalidEntityError> {
        let entity = normalize(&observation.entity)?;
        let key = ReportKey::new(entity, observation.source_id, observation.property);
        let ttl = observation.ttl.unwrap_or(self.settings.default_ttl);

        let (outcome, outgoing) = self.store.transition(&key, |prev| {
            if self.closed.contains(&key.source_id) {
                return (Transition::Keep, (Outcome::SourceClosed, None));
            }
            decide(
                prev,
                &key,
                observation.state,
                observation.code,
                observation.message,
                ttl,
                now_ms,
            )
        });

        match outcome {
            Outcome::Raised | Outcome::Escalated => tracing::info!(
                fingerprint = %key.fingerprint(),
                key = %key,
                state = %observation.state,
                ?outcome,
                "health condition raised"
            ),
            Outcome::Refreshed => tracing::debug!(fingerprint = %key.fingerprint(), key = %key, "health condition refreshed"),
            Outcome::Cleared => {
                self.state.increment_reports_cleared();
                tracing::info!(fingerprint = %key.fingerprint(), key = %key, "health condition cleared");
            }
            Outcome::Stale => tracing::debug!(
                fingerprint = %key.fingerprint(),
                key = %key,
                now_ms,
                "evaluation older than stored report, ignored"
            ),
            Outcome::SourceClosed => tracing::warn!(
                fingerprint = %key.fingerprint(),
                key = %key,
                "evaluation from a stopped source, ignored"
            ),
            Outcome::Unchanged => {}
        }

        if let Some(report) = outgoing {
            self.send(&report).await;
        }
        Ok(outcome)
    }

    /// Stop path: closes `source_id` so late evaluations write nothing, drops
    /// every report it owns and sends an Ok for each unhealthy one. Returns
    /// the Ok reports that were sent. [`Reconciler::open_source`] undoes the
    /// close.
    pub async fn clear_source(&self, source_id: &str, now_ms: i64) -> Vec<HealthReport> {
        self.closed.insert(source_id.to_string());
        let removed = self.store.remove_all_for_source(source_id);
        let mut cleared = Vec::with_capacity(removed.len());

        for report in removed.into_iter().filter(|r| r.is_active()) {
            let ok = report.clearing(format!("{source_id} stopped"), now_ms);
            self.state.increment_reports_cleared();
            self.send(&ok).await;
            cleared.push(ok);
        }

        tracing::info!(source_id, cleared = cleared.len(), "cleared reports for stopped source");
        cleared
    }

    pub async fn report_monitor_failure(&self, source_id: &str, message: &str, now_ms: i64) -> Outcome {
        let observation = Observation::warning(
            EntityRef::node(self.settings.node_name.clone()),
            source_id,
            MONITOR_HEALTH_PROPERTY,
            MONITOR_FAILURE_CODE,
        )
        .with_message(message);
        self.evaluate_self_report(observation, now_ms).await
    }

    pub async fn clear_monitor_failure(&self, source_id: &str, now_ms: i64) -> Outcome {
        let observation = Observation::ok(
            EntityRef::node(self.settings.node_name.clone()),
            source_id,
            MONITOR_HEALTH_PROPERTY,
        )
        .with_message(format!("{source_id} pass succeeded"));
        self.evaluate_self_report(observation, now_ms).await
    }

    async fn evaluate_self_report(&self, observation: Observation, now_ms: i64) -> Outcome {
        match self.evaluate(observation, now_ms).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, "node name cannot be used for monitor self-reports");
                Outcome::Unchanged
            }
        }
    }

    async fn send(&self, report: &HealthReport) {
        self.state.increment_sink_sends();
        if let Err(e) = self.sink.accept(report).await {
            self.state.increment_sink_failures();
            tracing::warn!(
                sink = self.sink.name(),
                fingerprint = %report.key().fingerprint(),
                state = %report.state,
                error = %e,
                "sink call failed, next pass resends"
            );
        }
    }
}

fn decide(
    prev: Option<&HealthReport>,
    key: &ReportKey,
    state: HealthState,
    code: Option<String>,
    message: String,
    ttl: Duration,
    now_ms: i64,
) -> (Transition, (Outcome, Option<HealthReport>)) {
    if let Some(p) = prev {
        if p.last_refreshed_at_ms > now_ms {
            return (Transition::Keep, (Outcome::Stale, None));
        }
    }

    if !state.is_unhealthy() {
        return match prev {
            Some(p) if p.is_active() => {
                let ok = p.clearing(message, now_ms);
                (Transition::Remove, (Outcome::Cleared, Some(ok)))
            }
            Some(_) => (Transition::Remove, (Outcome::Unchanged, None)),
            None => (Transition::Keep, (Outcome::Unchanged, None)),
        };
    }

    let code = code.unwrap_or_else(|| {
        tracing::warn!(key = %key, state = %state, "unhealthy observation without a code");
        UNSPECIFIED_CODE.to_string()
    });

    let outcome = match prev {
        Some(p) if p.state == state => Outcome::Refreshed,
        Some(p) if p.is_active() => Outcome::Escalated,
        _ => Outcome::Raised,
    };

    let report = HealthReport {
        report_id: prev
            .filter(|p| p.is_active())
            .map(|p| p.report_id.clone())
            .unwrap_or_else(new_report_id),
        entity: key.entity.clone(),
        source_id: key.source_id.clone(),
        property: key.property.clone(),
        state,
        code: Some(code),
        message,
        time_to_live: ttl,
        created_at_ms: prev
            .filter(|p| p.is_active())
            .map(|p| p.created_at_ms)
            .unwrap_or(now_ms),
        last_refreshed_at_ms: now_ms,
        emit_ok: false,
    };

    (Transition::Put(report.clone()), (outcome, Some(report)))
}
