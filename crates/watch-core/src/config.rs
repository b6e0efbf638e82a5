use std::env;

/// Process configuration, read once at startup and injected into each
/// component at construction. Business logic never reads the environment
/// directly, so tests can run against fake credentials and endpoints.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Claude API key. Absent means every AI-backed flow fails fast with a
    /// configuration error instead of attempting a network call.
    pub claude_api_key: Option<String>,
    pub claude_model: String,
    pub database_url: String,
    pub bind_addr: String,
    /// Freshness window for news articles, in hours.
    pub news_window_hours: i64,
    /// Maximum number of articles kept per request.
    pub article_cap: usize,
}

impl WatchConfig {
    pub fn from_env() -> Self {
        Self {
            claude_api_key: env::var("CLAUDE_API_KEY").ok().filter(|k| !k.is_empty()),
            claude_model: env::var("CLAUDE_MODEL")
                .unwrap_or_else(|_| "claude-sonnet-4-5-20250929".to_string()),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://watchlist.db?mode=rwc".to_string()),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:5001".to_string()),
            news_window_hours: 24,
            article_cap: 5,
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            claude_api_key: None,
            claude_model: "claude-sonnet-4-5-20250929".to_string(),
            database_url: "sqlite://watchlist.db?mode=rwc".to_string(),
            bind_addr: "0.0.0.0:5001".to_string(),
            news_window_hours: 24,
            article_cap: 5,
        }
    }
}
