//! HTTP surface for the watchlist pipeline.
//!
//! Handlers assemble responses from the market-data, news, and insight
//! components; every JSON shape and error mapping lives here. Errors carry
//! an optional stage label so a failed insight call reports which artifact
//! could not be produced without leaking upstream detail to clients.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::json;
use sqlx::sqlite::SqlitePoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use insight_engine::InsightEngine;
use news_feed::GoogleNewsClient;
use watch_core::{WatchConfig, WatchError};
use yahoo_client::YahooClient;

pub mod insight_routes;
pub mod stock_routes;
pub mod store;

use store::WatchlistDb;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<WatchConfig>,
    pub market: YahooClient,
    pub news: GoogleNewsClient,
    pub insights: Arc<InsightEngine>,
    pub store: WatchlistDb,
}

/// Handler error: a pipeline error plus the stage it surfaced from.
pub struct AppError {
    inner: WatchError,
    stage: Option<&'static str>,
}

impl AppError {
    /// Attach a client-facing stage label used for generic 500s.
    pub fn stage(inner: WatchError, stage: &'static str) -> Self {
        Self {
            inner,
            stage: Some(stage),
        }
    }
}

impl From<WatchError> for AppError {
    fn from(inner: WatchError) -> Self {
        Self { inner, stage: None }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.inner {
            WatchError::NoData(_) => (
                StatusCode::TOO_MANY_REQUESTS,
                "Rate limited - wait 2 min".to_string(),
            ),
            WatchError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            WatchError::MissingApiKey => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.inner.to_string())
            }
            WatchError::Upstream(_) | WatchError::Malformed(_) | WatchError::Database(_) => {
                error!("Request failed: {}", self.inner);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    self.stage.unwrap_or("Service unavailable").to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(stock_routes::routes())
        .merge(insight_routes::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Arc::new(WatchConfig::from_env());

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let store = WatchlistDb::new(pool);
    store.init_schema().await?;

    if config.claude_api_key.is_none() {
        info!("CLAUDE_API_KEY not set; insight endpoints will return configuration errors");
    }

    let state = AppState {
        insights: Arc::new(InsightEngine::new(&config)),
        market: YahooClient::new(),
        news: GoogleNewsClient::new(),
        store,
        config: config.clone(),
    };

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Listening on {}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_data_maps_to_429() {
        let response =
            AppError::from(WatchError::NoData("no rows".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let response =
            AppError::from(WatchError::NotFound("Stock not in watchlist".to_string()))
                .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_missing_key_and_upstream_map_to_500() {
        let missing = AppError::from(WatchError::MissingApiKey).into_response();
        assert_eq!(missing.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let upstream = AppError::stage(
            WatchError::Upstream("timeout".to_string()),
            "Failed to generate summary",
        )
        .into_response();
        assert_eq!(upstream.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
