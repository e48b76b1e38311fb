use std::{net::IpAddr, sync::Arc, time::Instant};

use anyhow::Context;
use askama::Template;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sqlx::SqlitePool;

use settings::AppConfig;

mod api;
mod app;
mod db;
mod models;
mod routes;
mod services;
mod settings;
mod views;

#[cfg(test)]
mod test_util;

pub struct AppState {
    pub config: AppConfig,
    pub pool: SqlitePool,
    pub started_at: Instant,
}

// Error type for the HTML views. The JSON API has its own, see `api::ApiError`.
#[derive(Debug)]
pub struct AppError(anyhow::Error);

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorPageTemplate {
    message: String,
    status_code: StatusCode,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        log::error!("view error: {:#}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorPageTemplate {
                status_code: StatusCode::INTERNAL_SERVER_ERROR,
                message: self.0.to_string(),
            },
        )
            .into_response()
    }
}

// Lets `?` lift sqlx and anyhow errors straight into view handlers.
impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

fn log_lan_address(config: &AppConfig) {
    let unspecified = config
        .api_host
        .parse::<IpAddr>()
        .map(|ip| ip.is_unspecified())
        .unwrap_or(false);
    if !unspecified {
        return;
    }
    match local_ip_address::local_ip() {
        Ok(ip) => log::info!("reachable on the local network at http://{}:{}", ip, config.api_port),
        Err(e) => log::debug!("could not determine local ip: {}", e),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "info");
    }
    pretty_env_logger::init();

    let config = AppConfig::new().context("failed to load configuration")?;
    let pool = db::connect(&config.database_url, config.database_pool_size).await?;
    let state = Arc::new(AppState {
        config,
        pool,
        started_at: Instant::now(),
    });

    let app = app::build_app(state.clone())?;

    let listener = tokio::net::TcpListener::bind(state.config.bind_address())
        .await
        .with_context(|| format!("could not bind {}", state.config.bind_address()))?;
    log::info!("listening on {}", listener.local_addr()?);
    log_lan_address(&state.config);

    axum::serve(listener, app).await?;
    Ok(())
}
