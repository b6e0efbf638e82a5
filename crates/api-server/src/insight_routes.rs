//! AI insight endpoints.
//!
//! Every handler checks the model credential before fetching any inputs, so
//! an unconfigured deployment fails fast instead of burning upstream quota.
//! Input-side failures degrade where the underlying flow allows it; only
//! the generation step itself surfaces a stage-specific error.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use watch_core::{ArticleSummary, DailyRationale, Sentiment};

use crate::stock_routes::{fetch_company_news, UserQuery};
use crate::{AppError, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/stock_summary/:ticker", get(stock_summary))
        .route("/api/stock_sentiment/:ticker", get(stock_sentiment))
        .route("/api/article_summaries/:ticker", get(article_summaries))
        .route("/api/article_detail", post(article_detail))
        .route("/api/daily_summary/:ticker", get(daily_summary))
}

#[derive(Serialize)]
struct SummaryResponse {
    ticker: String,
    company_name: String,
    summary: String,
    article_count: usize,
}

async fn stock_summary(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(user): Query<UserQuery>,
) -> Result<Json<SummaryResponse>, AppError> {
    state.insights.ensure_configured()?;

    let ticker = ticker.to_uppercase();
    let (company_name, articles) = fetch_company_news(&state, user.user_id(), &ticker).await?;

    let summary = state
        .insights
        .topic_summary(&ticker, &company_name, &articles)
        .await
        .map_err(|e| AppError::stage(e, "Failed to generate summary"))?;

    Ok(Json(SummaryResponse {
        ticker,
        company_name,
        summary,
        article_count: articles.len(),
    }))
}

#[derive(Serialize)]
struct SentimentResponse {
    ticker: String,
    company_name: Option<String>,
    sentiment: Sentiment,
    article_sentiments: Vec<Sentiment>,
    price_change: f64,
    /// Dollar price, or the string `"N/A"` when no quote was available.
    current_price: Value,
    article_count: usize,
}

/// Sentiment degrades instead of failing: a missing quote or an empty news
/// fetch each fall back (price-sign sentiment, then neutral) and only the
/// generation call itself can error the request.
async fn stock_sentiment(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(user): Query<UserQuery>,
) -> Result<Json<SentimentResponse>, AppError> {
    state.insights.ensure_configured()?;

    let ticker = ticker.to_uppercase();

    let news = fetch_company_news(&state, user.user_id(), &ticker).await.ok();
    let quote = state.market.get_quote(&ticker).await.ok();

    let (company_name, articles) = match news {
        Some((name, articles)) => (Some(name), articles),
        None => (None, Vec::new()),
    };
    let company_label = company_name.as_deref().unwrap_or(ticker.as_str());

    let result = state
        .insights
        .sentiment(&ticker, company_label, &articles, quote.as_ref())
        .await
        .map_err(|e| AppError::stage(e, "Failed to generate sentiment analysis"))?;

    let (price_change, current_price) = match &quote {
        Some(q) => (q.change_percent, json!(q.current_price)),
        None => (0.0, json!("N/A")),
    };

    Ok(Json(SentimentResponse {
        ticker,
        company_name,
        sentiment: result.overall,
        article_sentiments: result.per_article,
        price_change,
        current_price,
        article_count: articles.len(),
    }))
}

#[derive(Serialize)]
struct SummariesResponse {
    ticker: String,
    company_name: String,
    summaries: Vec<ArticleSummary>,
}

async fn article_summaries(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(user): Query<UserQuery>,
) -> Result<Json<SummariesResponse>, AppError> {
    state.insights.ensure_configured()?;

    let ticker = ticker.to_uppercase();
    let (company_name, articles) = fetch_company_news(&state, user.user_id(), &ticker).await?;

    let summaries = state
        .insights
        .article_summaries(&ticker, &company_name, &articles)
        .await
        .map_err(|e| AppError::stage(e, "Failed to generate summaries"))?;

    Ok(Json(SummariesResponse {
        ticker,
        company_name,
        summaries,
    }))
}

#[derive(Deserialize)]
struct ArticleDetailRequest {
    ticker: String,
    company_name: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    price_change: f64,
}

async fn article_detail(
    State(state): State<AppState>,
    Json(request): Json<ArticleDetailRequest>,
) -> Result<Json<Value>, AppError> {
    state.insights.ensure_configured()?;

    let detail = state
        .insights
        .article_detail(
            &request.ticker.to_uppercase(),
            &request.company_name,
            &request.title,
            &request.description,
            request.price_change,
        )
        .await
        .map_err(|e| AppError::stage(e, "Failed to generate article detail"))?;

    Ok(Json(json!({ "detail": detail })))
}

/// Rationale tolerates a failed nested sentiment pass: the model's opinion
/// is replaced by the price sign so one bad generation never takes down the
/// whole daily summary.
async fn daily_summary(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(user): Query<UserQuery>,
) -> Result<Json<DailyRationale>, AppError> {
    state.insights.ensure_configured()?;

    let ticker = ticker.to_uppercase();

    let quote = state.market.get_quote(&ticker).await.ok();
    let (company_name, articles) = fetch_company_news(&state, user.user_id(), &ticker)
        .await
        .unwrap_or_else(|_| (ticker.clone(), Vec::new()));

    let overall = match state
        .insights
        .sentiment(&ticker, &company_name, &articles, quote.as_ref())
        .await
    {
        Ok(result) => result.overall,
        Err(e) => {
            warn!("Sentiment pass failed for {}, using price sign: {}", ticker, e);
            match &quote {
                Some(q) => Sentiment::from_change_percent(q.change_percent),
                None => Sentiment::Neutral,
            }
        }
    };

    let top_titles: Vec<String> = articles.iter().take(3).map(|a| a.title.clone()).collect();

    let rationale = state
        .insights
        .daily_rationale(&ticker, quote.as_ref(), overall, &top_titles)
        .await
        .map_err(|e| AppError::stage(e, "Failed to generate daily summary"))?;

    Ok(Json(rationale))
}
