//! Market-data client over the Yahoo Finance v8 chart API.
//!
//! Fetches daily close history and derives the most-recent-close quote with
//! its day-over-day percent change. Quotes are recomputed on every request;
//! nothing is cached.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use watch_core::{DailyClose, MarketDataProvider, PriceQuote, WatchError};

const BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

#[derive(Clone)]
pub struct YahooClient {
    client: Client,
}

impl YahooClient {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent("Mozilla/5.0 (compatible; StockWatch/0.1)")
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client }
    }

    /// Fetch the quote for `ticker` from the last 5 calendar days of daily
    /// closes. Zero rows is `NoData` (the caller maps it to 429); transport
    /// or parse failures are `Upstream`.
    pub async fn get_quote(&self, ticker: &str) -> Result<PriceQuote, WatchError> {
        let history = self.history(ticker, 5).await?;
        let closes: Vec<f64> = history.iter().map(|row| row.close).collect();

        tracing::debug!("Fetched {}: {} close rows", ticker, closes.len());

        quote_from_closes(ticker, &closes)
    }
}

impl Default for YahooClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataProvider for YahooClient {
    async fn history(&self, ticker: &str, days: u32) -> Result<Vec<DailyClose>, WatchError> {
        let url = format!("{}/{}", BASE_URL, ticker);

        let response = self
            .client
            .get(&url)
            .query(&[("range", format!("{}d", days)), ("interval", "1d".to_string())])
            .send()
            .await
            .map_err(|e| WatchError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            return Err(WatchError::Upstream(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let envelope: ChartEnvelope = response
            .json()
            .await
            .map_err(|e| WatchError::Upstream(e.to_string()))?;

        if let Some(error) = envelope.chart.error {
            return Err(WatchError::Upstream(format!(
                "{}: {}",
                error.code, error.description
            )));
        }

        let result = match envelope.chart.result.and_then(|mut r| {
            if r.is_empty() {
                None
            } else {
                Some(r.remove(0))
            }
        }) {
            Some(result) => result,
            None => return Ok(Vec::new()),
        };

        let closes = result
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|q| q.close)
            .unwrap_or_default();

        // Yahoo pads half-finished sessions with nulls; skip them.
        let rows = result
            .timestamp
            .iter()
            .zip(closes)
            .filter_map(|(&ts, close)| {
                let close = close?;
                let date = DateTime::<Utc>::from_timestamp(ts, 0)?;
                Some(DailyClose { date, close })
            })
            .collect();

        Ok(rows)
    }
}

/// Derive a quote from an ordered (oldest-first) close series.
///
/// Zero rows means the source is rate limited or knows nothing about the
/// ticker; one row means there is no prior close to compare against.
pub fn quote_from_closes(ticker: &str, closes: &[f64]) -> Result<PriceQuote, WatchError> {
    let current = match closes.last() {
        Some(&close) => close,
        None => return Err(WatchError::NoData(format!("no close rows for {}", ticker))),
    };

    let change_percent = if closes.len() >= 2 {
        let prior = closes[closes.len() - 2];
        (current - prior) / prior * 100.0
    } else {
        0.0
    };

    Ok(PriceQuote {
        ticker: ticker.to_string(),
        current_price: round2(current),
        change_percent: round2(change_percent),
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// -- wire format --------------------------------------------------------

#[derive(Deserialize)]
struct ChartEnvelope {
    chart: ChartNode,
}

#[derive(Deserialize)]
struct ChartNode {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteBlock>,
}

#[derive(Deserialize)]
struct QuoteBlock {
    #[serde(default)]
    close: Vec<Option<f64>>,
}
