use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A typed link attached to a feed entry (href plus declared MIME type).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryLink {
    pub href: String,
    pub mime_type: Option<String>,
}

/// Raw search-result entry as returned by the news source, before freshness
/// filtering. Optional feed attributes (media attachments, extra links) are
/// resolved once here, at the adapter boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEntry {
    pub title: String,
    pub summary: String,
    pub link: String,
    /// Publication timestamp exactly as the upstream feed printed it.
    pub published: String,
    pub source: String,
    /// URL of an embedded media attachment, when the feed carried one.
    pub media_url: Option<String>,
    pub links: Vec<EntryLink>,
}

/// A news article that survived the freshness filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub description: String,
    pub url: String,
    /// Raw upstream publication string, passed through untouched.
    pub published: String,
    pub source: String,
    pub image: Option<String>,
}

/// One daily close row from the market-data source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyClose {
    pub date: DateTime<Utc>,
    pub close: f64,
}

/// Most-recent-close price with day-over-day change, recomputed per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceQuote {
    pub ticker: String,
    pub current_price: f64,
    pub change_percent: f64,
}

/// Coarse directional classification of an article or news set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Bullish,
    Bearish,
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Bullish => "bullish",
            Sentiment::Bearish => "bearish",
            Sentiment::Neutral => "neutral",
        }
    }

    /// Parse a wire-format label. Unknown labels are rejected, not guessed.
    pub fn parse_label(label: &str) -> Option<Sentiment> {
        match label.trim().to_lowercase().as_str() {
            "bullish" => Some(Sentiment::Bullish),
            "bearish" => Some(Sentiment::Bearish),
            "neutral" => Some(Sentiment::Neutral),
            _ => None,
        }
    }

    /// Price-only sentiment: sign of the daily change decides.
    pub fn from_change_percent(change_percent: f64) -> Sentiment {
        if change_percent > 0.0 {
            Sentiment::Bullish
        } else if change_percent < 0.0 {
            Sentiment::Bearish
        } else {
            Sentiment::Neutral
        }
    }
}

/// Overall plus per-article sentiment, aligned by position to the input
/// article list. `per_article.len()` always equals the article count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentResult {
    pub overall: Sentiment,
    pub per_article: Vec<Sentiment>,
}

/// One-sentence AI headline for a single article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub headline: String,
    pub url: String,
    pub source: String,
    pub title: String,
    pub description: String,
}

/// One-line explanation of the day's price move.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyRationale {
    pub ticker: String,
    pub daily_summary: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentiment_from_change() {
        assert_eq!(Sentiment::from_change_percent(2.5), Sentiment::Bullish);
        assert_eq!(Sentiment::from_change_percent(-1.0), Sentiment::Bearish);
        assert_eq!(Sentiment::from_change_percent(0.0), Sentiment::Neutral);
    }

    #[test]
    fn test_parse_label() {
        assert_eq!(Sentiment::parse_label(" Bullish "), Some(Sentiment::Bullish));
        assert_eq!(Sentiment::parse_label("BEARISH"), Some(Sentiment::Bearish));
        assert_eq!(Sentiment::parse_label("mixed"), None);
        assert_eq!(Sentiment::parse_label(""), None);
    }
}
