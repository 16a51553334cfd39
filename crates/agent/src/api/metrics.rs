use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use super::state::AgentState;

pub async fn metrics(State(state): State<AgentState>) -> impl IntoResponse {
    let body = format!(
        "# HELP vigil_reports_active Health reports currently raised\n\
         # TYPE vigil_reports_active gauge\n\
         vigil_reports_active {}\n\
         # HELP vigil_monitors_running Monitor loops currently running\n\
         # TYPE vigil_monitors_running gauge\n\
         vigil_monitors_running {}\n\
         # HELP vigil_sink_sends_total Reports handed to the sink\n\
         # TYPE vigil_sink_sends_total counter\n\
         vigil_sink_sends_total {}\n\
         # HELP vigil_sink_failures_total Reports the sink did not accept\n\
         # TYPE vigil_sink_failures_total counter\n\
         vigil_sink_failures_total {}\n\
         # HELP vigil_monitor_pass_failures_total Monitor passes that failed or panicked\n\
         # TYPE vigil_monitor_pass_failures_total counter\n\
         vigil_monitor_pass_failures_total {}\n\
         # HELP vigil_reports_cleared_total Reports cleared with an Ok\n\
         # TYPE vigil_reports_cleared_total counter\n\
         vigil_reports_cleared_total {}\n",
        state.reports_active(),
        state.monitors_running(),
        state.sink_sends(),
        state.sink_failures(),
        state.pass_failures(),
        state.reports_cleared(),
    );

    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}
