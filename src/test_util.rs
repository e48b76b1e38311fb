use std::{sync::Arc, time::Instant};

use axum::{
    body::{to_bytes, Body},
    http::Request,
    response::Response,
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use crate::{app::build_app, db, settings::AppConfig, AppState};

pub async fn test_state() -> Arc<AppState> {
    test_state_with(AppConfig::default()).await
}

pub async fn test_state_with(config: AppConfig) -> Arc<AppState> {
    Arc::new(AppState {
        config,
        pool: db::in_memory().await.expect("in-memory database"),
        started_at: Instant::now(),
    })
}

pub async fn test_app() -> (Router, Arc<AppState>) {
    test_app_with(AppConfig::default()).await
}

pub async fn test_app_with(config: AppConfig) -> (Router, Arc<AppState>) {
    let state = test_state_with(config).await;
    let app = build_app(state.clone()).expect("router");
    (app, state)
}

pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.expect("infallible")
}

pub async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_text(response).await).expect("json body")
}
