use async_trait::async_trait;

use crate::{DailyClose, RawEntry, WatchError};

/// Trait for market-data sources providing daily close history.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Daily closes for the last `days` calendar days, oldest first.
    /// An empty result means the source had no rows (rate limited or
    /// unknown ticker), which is distinct from a transport failure.
    async fn history(&self, ticker: &str, days: u32) -> Result<Vec<DailyClose>, WatchError>;
}

/// Trait for news search sources.
///
/// Search is best-effort by contract: transport failures degrade to an
/// empty result so the pipeline can fall back to "no news".
#[async_trait]
pub trait NewsSearcher: Send + Sync {
    async fn search(&self, query: &str, window_days: u32) -> Vec<RawEntry>;
}

/// Trait for text-generation model backends.
#[async_trait]
pub trait TextModel: Send + Sync {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, WatchError>;
}

/// Read-only view of the watchlist row store used by the pipeline.
#[async_trait]
pub trait WatchlistStore: Send + Sync {
    async fn company_name(&self, user_id: i64, ticker: &str)
        -> Result<Option<String>, WatchError>;
}
