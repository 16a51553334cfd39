use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use super::health;
use super::metrics;
use super::reports;
use super::state::AgentState;

pub fn router(state: AgentState) -> Router {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/ready", get(health::ready))
        .route("/metrics", get(metrics::metrics))
        .route("/reports", get(reports::reports))
        .with_state(state)
}

pub async fn serve(listener: TcpListener, state: AgentState) -> std::io::Result<()> {
    let app = router(state);
    axum::serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ReportStore;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::time::Duration;
    use tower::ServiceExt;
    use vigil_common::{EntityRef, HealthReport, HealthState};

    async fn send(app: Router, uri: &str) -> (StatusCode, String) {
        let req = Request::get(uri).body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    fn warning(entity: EntityRef, source: &str, property: &str) -> HealthReport {
        HealthReport {
            report_id: format!("{source}-{property}"),
            entity,
            source_id: source.into(),
            property: property.into(),
            state: HealthState::Warning,
            code: Some("W".into()),
            message: "high".into(),
            time_to_live: Duration::from_secs(300),
            created_at_ms: 1,
            last_refreshed_at_ms: 1,
            emit_ok: false,
        }
    }

    #[tokio::test]
    async fn routes_respond() {
        let state = AgentState::new(ReportStore::new());
        state.set_monitors_running(1);
        let app = router(state);

        let (status, _) = send(app.clone(), "/healthz").await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(app.clone(), "/ready").await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(app, "/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("vigil_"));
    }

    #[tokio::test]
    async fn not_ready_without_monitors() {
        let app = router(AgentState::new(ReportStore::new()));
        let (status, _) = send(app, "/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn reports_filter_by_source() {
        let store = ReportStore::new();
        store.upsert(warning(EntityRef::disk("C:"), "DiskObserver", "DiskSpacePercent"));
        store.upsert(warning(EntityRef::disk("D:"), "DiskObserver", "DiskSpacePercent"));
        store.upsert(warning(EntityRef::node("_Node_0"), "NodeObserver", "CpuPercent"));
        let app = router(AgentState::new(store));

        let (status, body) = send(app.clone(), "/reports").await;
        assert_eq!(status, StatusCode::OK);
        let all: Vec<serde_json::Value> = serde_json::from_str(&body).unwrap();
        assert_eq!(all.len(), 3);

        let (_, body) = send(app.clone(), "/reports?source=DiskObserver").await;
        let disk: Vec<serde_json::Value> = serde_json::from_str(&body).unwrap();
        assert_eq!(disk.len(), 2);
        assert!(disk.iter().all(|r| r["source_id"] == "DiskObserver"));

        let (_, body) = send(app, "/reports?source=nobody").await;
        assert_eq!(body, "[]");
    }
}
