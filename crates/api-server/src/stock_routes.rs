//! Market data, news, and watchlist endpoints.

use axum::extract::{Path, Query, State};
use axum::routing::{delete, get};
use axum::{Json, Router};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use watch_core::{Article, NewsSearcher, WatchError, WatchlistStore};

use crate::store::WatchlistRow;
use crate::{AppError, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/stock_price/:ticker", get(stock_price))
        .route("/api/stock_news/:ticker", get(stock_news))
        .route("/api/watchlist", get(list_watchlist).post(add_stock))
        .route("/api/watchlist/:ticker", delete(remove_stock))
}

#[derive(Deserialize)]
pub struct UserQuery {
    user_id: Option<i64>,
}

impl UserQuery {
    /// Single-user deployments omit the parameter.
    pub fn user_id(&self) -> i64 {
        self.user_id.unwrap_or(1)
    }
}

/// Resolve the company name for a watched ticker, then search news with a
/// one-day recency hint and fall back to two days when the tighter window
/// comes back empty. The strict freshness cutoff is enforced afterwards
/// either way.
pub(crate) async fn fetch_company_news(
    state: &AppState,
    user_id: i64,
    ticker: &str,
) -> Result<(String, Vec<Article>), AppError> {
    let company_name = state
        .store
        .company_name(user_id, ticker)
        .await?
        .ok_or_else(|| WatchError::NotFound("Stock not in watchlist".to_string()))?;

    let query = format!("{} stock {}", company_name, ticker);

    let mut entries = state.news.search(&query, 1).await;
    if entries.is_empty() {
        entries = state.news.search(&query, 2).await;
    }

    let cutoff = Utc::now() - Duration::hours(state.config.news_window_hours);
    let articles = news_feed::filter_fresh(&entries, cutoff, state.config.article_cap);

    Ok((company_name, articles))
}

async fn stock_price(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<Json<watch_core::PriceQuote>, AppError> {
    let ticker = ticker.to_uppercase();
    let quote = state.market.get_quote(&ticker).await?;
    Ok(Json(quote))
}

#[derive(Serialize)]
struct NewsResponse {
    ticker: String,
    company_name: String,
    articles: Vec<Article>,
}

async fn stock_news(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(user): Query<UserQuery>,
) -> Result<Json<NewsResponse>, AppError> {
    let ticker = ticker.to_uppercase();
    let (company_name, articles) = fetch_company_news(&state, user.user_id(), &ticker).await?;

    Ok(Json(NewsResponse {
        ticker,
        company_name,
        articles,
    }))
}

async fn list_watchlist(
    State(state): State<AppState>,
    Query(user): Query<UserQuery>,
) -> Result<Json<Vec<WatchlistRow>>, AppError> {
    let rows = state.store.list(user.user_id()).await?;
    Ok(Json(rows))
}

#[derive(Deserialize)]
struct AddStockRequest {
    ticker: String,
    company_name: String,
    user_id: Option<i64>,
}

async fn add_stock(
    State(state): State<AppState>,
    Json(request): Json<AddStockRequest>,
) -> Result<Json<Value>, AppError> {
    let ticker = request.ticker.to_uppercase();
    state
        .store
        .add(request.user_id.unwrap_or(1), &ticker, &request.company_name)
        .await?;
    Ok(Json(json!({ "status": "added", "ticker": ticker })))
}

async fn remove_stock(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(user): Query<UserQuery>,
) -> Result<Json<Value>, AppError> {
    let ticker = ticker.to_uppercase();
    state.store.remove(user.user_id(), &ticker).await?;
    Ok(Json(json!({ "status": "removed", "ticker": ticker })))
}
