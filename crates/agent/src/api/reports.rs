use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use super::state::AgentState;
use vigil_common::HealthReport;

#[derive(Debug, Default, Deserialize)]
pub struct ReportsQuery {
    pub source: Option<String>,
}

/// Active reports ordered by tuple, optionally limited to one source.
pub async fn reports(
    State(state): State<AgentState>,
    Query(query): Query<ReportsQuery>,
) -> Json<Vec<HealthReport>> {
    let view = state
        .store()
        .list_active(|r| query.source.as_deref().map_or(true, |s| r.source_id == s));
    let mut active: Vec<HealthReport> = view.iter().collect();
    active.sort_by_key(|r| r.key());
    Json(active)
}
