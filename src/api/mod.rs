use axum::{
    extract::OriginalUri,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

mod error;
mod health;
mod issues;

pub use error::ApiError;

pub const SERVICE_NAME: &str = "issue-tracker";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

async fn api_root() -> Json<Value> {
    Json(json!({
        "message": "Issue Tracker API",
        "version": VERSION,
        "health": "/api/health",
    }))
}

async fn api_not_found(OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::RouteNotFound(uri.path().to_string())
}

pub fn get_routes() -> axum::Router {
    Router::new()
        .route("/", get(api_root))
        .route("/health", get(health::health_check))
        .route("/health/detailed", get(health::detailed_health_check))
        .route(
            "/issues",
            get(issues::list_issues).post(issues::create_issue),
        )
        .route("/issues/bulk", post(issues::bulk_create_issues))
        .route(
            "/issues/:id",
            get(issues::get_issue)
                .put(issues::update_issue)
                .delete(issues::delete_issue),
        )
        .fallback(api_not_found)
}
