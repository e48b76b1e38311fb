use std::sync::Arc;

use axum::{Extension, Json};
use serde::Serialize;

use super::{now_rfc3339, SERVICE_NAME, VERSION};
use crate::{db, AppState};

#[derive(Debug, Serialize)]
pub struct Health {
    status: &'static str,
    timestamp: String,
    service: &'static str,
    version: &'static str,
    database: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Components {
    database: &'static str,
    api: &'static str,
    dependencies: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DetailedHealth {
    status: &'static str,
    timestamp: String,
    service: &'static str,
    version: &'static str,
    components: Components,
    uptime: String,
    uptime_seconds: u64,
    environment: String,
}

fn database_status(connected: bool) -> (&'static str, &'static str) {
    if connected {
        ("ok", "connected")
    } else {
        ("degraded", "disconnected")
    }
}

/// Always answers 200; a failing database shows up as `degraded`.
pub async fn health_check(Extension(state): Extension<Arc<AppState>>) -> Json<Health> {
    let (status, database) = database_status(db::ping(&state.pool).await);
    Json(Health {
        status,
        timestamp: now_rfc3339(),
        service: SERVICE_NAME,
        version: VERSION,
        database,
    })
}

pub async fn detailed_health_check(
    Extension(state): Extension<Arc<AppState>>,
) -> Json<DetailedHealth> {
    let connected = db::ping(&state.pool).await;
    let (status, database) = database_status(connected);
    let uptime_seconds = state.started_at.elapsed().as_secs();
    Json(DetailedHealth {
        status,
        timestamp: now_rfc3339(),
        service: SERVICE_NAME,
        version: VERSION,
        components: Components {
            database,
            api: "operational",
            dependencies: if connected { "healthy" } else { "unhealthy" },
        },
        uptime: format!("{}s", uptime_seconds),
        uptime_seconds,
        environment: state.config.environment.clone(),
    })
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };

    use crate::test_util::{body_json, send, test_app};

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn health_reports_connected_database() {
        let (app, _) = test_app().await;
        let response = send(&app, get("/api/health")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "issue-tracker");
        assert_eq!(body["database"], "connected");
        assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn detailed_health_lists_components() {
        let (app, _) = test_app().await;
        let body = body_json(send(&app, get("/api/health/detailed")).await).await;
        assert_eq!(body["components"]["api"], "operational");
        assert_eq!(body["environment"], "development");
    }

    #[tokio::test]
    async fn closed_pool_is_degraded() {
        let (app, state) = test_app().await;
        state.pool.close().await;
        let body = body_json(send(&app, get("/api/health")).await).await;
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["database"], "disconnected");
    }

    #[tokio::test]
    async fn api_root_describes_service() {
        let (app, _) = test_app().await;
        let body = body_json(send(&app, get("/api")).await).await;
        assert_eq!(body["message"], "Issue Tracker API");
        assert_eq!(body["version"], "1.0.0");
    }
}
