use std::sync::Arc;

use anyhow::{Context, Result};
use askama_axum::IntoResponse;
use axum::{
    extract::RawQuery,
    http::{HeaderValue, Method, Uri},
    response::{Redirect, Response},
    Extension, Router,
};
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    services::ServeDir,
};

use crate::{
    api,
    routes::{self, redirect_location, RouteTarget, APP_ROUTES},
    views, AppError, AppState,
};

/// Mounts the navigation table, the JSON API and static assets.
pub fn build_app(state: Arc<AppState>) -> Result<Router> {
    let mut router = Router::new();
    for route in APP_ROUTES.iter().filter(|route| !route.is_wildcard()) {
        if let RouteTarget::Render(view) = route.target {
            router = router.route(&route.mount_path(), views::view_route(view));
        }
    }

    let cors = cors_layer(&state.config.cors_origins)?;
    Ok(router
        .nest("/api", api::get_routes())
        .nest_service("/static", ServeDir::new(&state.config.static_dir))
        .fallback(navigate)
        .layer(cors)
        .layer(Extension(state)))
}

// Anything the router could not place goes back through the table, which
// either renders a normalized spelling of a known path or redirects.
async fn navigate(
    Extension(state): Extension<Arc<AppState>>,
    uri: Uri,
    RawQuery(query): RawQuery,
) -> Result<Response, AppError> {
    match routes::resolve(uri.path()) {
        RouteTarget::Render(view) => views::render(view, &state, query.as_deref()).await,
        RouteTarget::Redirect(to) => {
            let location = redirect_location(to);
            log::debug!("no route for {}, redirecting to {}", uri.path(), location);
            Ok(Redirect::to(&location).into_response())
        }
    }
}

/// `*` in the origin list allows any origin. With credentials enabled the
/// literal wildcard is not a valid response header, so the caller's origin is
/// echoed back instead.
fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let allow_origin = if origins.iter().any(|origin| origin == "*") {
        AllowOrigin::mirror_request()
    } else {
        let origins = origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin)
                    .with_context(|| format!("invalid CORS origin {}", origin))
            })
            .collect::<Result<Vec<_>>>()?;
        AllowOrigin::list(origins)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::mirror_request()))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };

    use crate::{
        settings::AppConfig,
        test_util::{body_json, body_text, send, test_app, test_app_with},
    };

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn root_renders_issue_list() {
        let (app, _) = test_app().await;
        let response = send(&app, get("/")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("id=\"issue-list\""));
    }

    #[tokio::test]
    async fn issues_path_renders_issue_list() {
        let (app, _) = test_app().await;
        for uri in ["/issues", "/issues/", "/issues?status=open&page=2"] {
            let response = send(&app, get(uri)).await;
            assert_eq!(response.status(), StatusCode::OK, "{}", uri);
            assert!(body_text(response).await.contains("id=\"issue-list\""));
        }
    }

    #[tokio::test]
    async fn unmatched_paths_redirect_home() {
        let (app, _) = test_app().await;
        for uri in [
            "/nope",
            "/issues/iss-1234abcd",
            "/deeply/nested/path",
            "/nope?page=not-a-number",
        ] {
            let response = send(&app, get(uri)).await;
            assert_eq!(response.status(), StatusCode::SEE_OTHER, "{}", uri);
            assert_eq!(response.headers()[header::LOCATION], "/", "{}", uri);
        }
    }

    #[tokio::test]
    async fn bad_list_query_still_renders() {
        let (app, _) = test_app().await;
        let response = send(&app, get("/issues?page=abc&page_size=1")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_api_path_is_json_404() {
        let (app, _) = test_app().await;
        let response = send(&app, get("/api/does-not-exist")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["detail"]["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn cors_allows_configured_origin() {
        let (app, _) = test_app().await;
        let request = Request::builder()
            .uri("/api/health")
            .header(header::ORIGIN, "http://localhost:4200")
            .body(Body::empty())
            .unwrap();
        let response = send(&app, request).await;
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:4200"
        );
    }

    #[tokio::test]
    async fn wildcard_origin_echoes_caller() {
        let config = AppConfig {
            cors_origins: vec!["*".to_string()],
            ..AppConfig::default()
        };
        let (app, _) = test_app_with(config).await;
        let request = Request::builder()
            .uri("/api/health")
            .header(header::ORIGIN, "https://tracker.example.org")
            .body(Body::empty())
            .unwrap();
        let response = send(&app, request).await;
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://tracker.example.org"
        );
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
            "true"
        );
    }

    #[test]
    fn wildcard_origin_builds_layer() {
        assert!(super::cors_layer(&["*".to_string()]).is_ok());
        assert!(super::cors_layer(&["http://localhost:4200".to_string(), "*".to_string()]).is_ok());
    }

    #[test]
    fn invalid_origin_is_a_startup_error() {
        assert!(super::cors_layer(&["bad\norigin".to_string()]).is_err());
    }
}
