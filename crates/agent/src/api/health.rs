use axum::http::StatusCode;
use axum::extract::State;
use super::state::AgentState;

pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Ready once at least one monitor loop is running.
pub async fn ready(State(state): State<AgentState>) -> StatusCode {
    if state.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
