//! AI insight generation for the watchlist pipeline.
//!
//! Five artifact flows share one pattern: sanitize every external string,
//! build a prompt, call the text-generation model with a token budget tuned
//! to the expected output, and parse the answer defensively. A missing API
//! credential is a configuration error reported before any network call;
//! everything else degrades per stage.

use futures_util::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::warn;

use watch_core::{
    sanitize, Article, ArticleSummary, DailyRationale, PriceQuote, Sentiment, SentimentResult,
    TextModel, WatchConfig, WatchError,
};

pub mod claude;
pub mod sentiment;

pub use claude::ClaudeClient;
pub use sentiment::parse_sentiment_response;

/// Token budgets per artifact, tuned to expected output size.
const SUMMARY_MAX_TOKENS: u32 = 400;
const SENTIMENT_MAX_TOKENS: u32 = 400;
const HEADLINE_MAX_TOKENS: u32 = 40;
const DETAIL_MAX_TOKENS: u32 = 150;
const RATIONALE_MAX_TOKENS: u32 = 60;

/// Bounded worker pool size for the per-article headline fan-out.
const HEADLINE_CONCURRENCY: usize = 5;

/// Fixed responses for short-circuited flows (no model call is made).
pub const NO_RECENT_NEWS: &str = "No recent news available for this stock.";
pub const MARKET_DATA_UNAVAILABLE: &str = "Market data unavailable for today's summary.";

/// Sentinel headline used when a single article's generation fails.
pub const HEADLINE_UNAVAILABLE: &str = "Summary unavailable.";

pub struct InsightEngine {
    model: Option<Arc<dyn TextModel>>,
}

impl InsightEngine {
    pub fn new(config: &WatchConfig) -> Self {
        let model = config.claude_api_key.clone().map(|key| {
            Arc::new(ClaudeClient::new(key, config.claude_model.clone())) as Arc<dyn TextModel>
        });
        Self { model }
    }

    /// Build the engine around an explicit model backend.
    pub fn with_model(model: Arc<dyn TextModel>) -> Self {
        Self { model: Some(model) }
    }

    /// Engine with no credential configured: every flow fails fast.
    pub fn unconfigured() -> Self {
        Self { model: None }
    }

    /// Credential gate, checked first in every AI-backed flow.
    fn model(&self) -> Result<&Arc<dyn TextModel>, WatchError> {
        self.model.as_ref().ok_or(WatchError::MissingApiKey)
    }

    /// Same gate for callers that want to fail before fetching inputs.
    pub fn ensure_configured(&self) -> Result<(), WatchError> {
        self.model().map(|_| ())
    }

    /// Topic-bucketed prose summary of the filtered articles. The model's
    /// raw text is the result; no machine parsing is applied.
    pub async fn topic_summary(
        &self,
        ticker: &str,
        company_name: &str,
        articles: &[Article],
    ) -> Result<String, WatchError> {
        let model = self.model()?;

        if articles.is_empty() {
            return Ok(NO_RECENT_NEWS.to_string());
        }

        let articles_text = articles
            .iter()
            .map(|a| format!("- {}\n  {}", sanitize(&a.title), sanitize(&a.description)))
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = format!(
            "Analyze these news articles about {company} ({ticker}) and create a structured summary.\n\n\
             Break the news into 2-4 distinct topics (e.g. acquisitions, earnings, product launches, \
             stock performance, regulatory news).\n\n\
             Format each topic as a bolded topic name followed by a 1-2 sentence summary of that topic.\n\n\
             Do not include a title or header; start directly with the first topic. Keep it concise.\n\n\
             Articles:\n{articles_text}",
            company = sanitize(company_name),
            ticker = sanitize(ticker),
        );

        model.complete(&prompt, SUMMARY_MAX_TOKENS).await
    }

    /// Overall plus per-article sentiment. With no articles the model is
    /// never called: price sign decides when a quote exists, otherwise
    /// neutral.
    pub async fn sentiment(
        &self,
        ticker: &str,
        company_name: &str,
        articles: &[Article],
        quote: Option<&PriceQuote>,
    ) -> Result<SentimentResult, WatchError> {
        let model = self.model()?;

        if articles.is_empty() {
            let overall = match quote {
                Some(q) => Sentiment::from_change_percent(q.change_percent),
                None => Sentiment::Neutral,
            };
            return Ok(SentimentResult {
                overall,
                per_article: Vec::new(),
            });
        }

        let numbered = articles
            .iter()
            .enumerate()
            .map(|(i, a)| format!("{}. {}", i + 1, sanitize(&a.title)))
            .collect::<Vec<_>>()
            .join("\n");

        let price_context = match quote {
            Some(q) => format!(
                "${:.2} ({:+.2}% daily change)",
                q.current_price, q.change_percent
            ),
            None => "unavailable".to_string(),
        };

        let prompt = format!(
            "Analyze the sentiment of these news headlines about {company} ({ticker}) \
             with stock price at {price_context}.\n\n\
             Headlines:\n{numbered}\n\n\
             Provide analysis in this EXACT format:\n\n\
             OVERALL: [bullish/bearish/neutral]\n\
             ARTICLES: [For each article, the number followed by its sentiment, \
             e.g. \"1:bullish 2:bearish 3:neutral\", space-separated]\n\n\
             Bullish = positive for stock price, Bearish = negative for stock price, \
             Neutral = no clear impact.",
            company = sanitize(company_name),
            ticker = sanitize(ticker),
        );

        let text = model.complete(&prompt, SENTIMENT_MAX_TOKENS).await?;
        Ok(parse_sentiment_response(&text, articles.len()))
    }

    /// One-sentence headline per article, generated concurrently with a
    /// bounded worker pool. Output is realigned to input positions before
    /// returning; a failed call yields the sentinel headline for that slot
    /// only and never cancels its siblings.
    pub async fn article_summaries(
        &self,
        ticker: &str,
        company_name: &str,
        articles: &[Article],
    ) -> Result<Vec<ArticleSummary>, WatchError> {
        let model = self.model()?;

        let jobs: Vec<_> = articles
            .iter()
            .enumerate()
            .map(|(index, article)| {
            let model = Arc::clone(model);
            let prompt = format!(
                "Summarize this news article about {company} ({ticker}) in ONE sentence \
                 of at most 15 words. Respond with the sentence only.\n\n\
                 Title: {title}\n\
                 Description: {description}",
                company = sanitize(company_name),
                ticker = sanitize(ticker),
                title = sanitize(&article.title),
                description = sanitize(&article.description),
            );

            async move {
                let headline = match model.complete(&prompt, HEADLINE_MAX_TOKENS).await {
                    Ok(text) => one_line(&text),
                    Err(e) => {
                        warn!("Headline generation failed for article {}: {}", index + 1, e);
                        HEADLINE_UNAVAILABLE.to_string()
                    }
                };
                (index, headline)
            }
        })
            .collect();

        // Completion order is arbitrary; reconstruct positional alignment
        // at join time.
        let completed: Vec<(usize, String)> = stream::iter(jobs)
            .buffer_unordered(HEADLINE_CONCURRENCY)
            .collect()
            .await;

        let mut headlines = vec![String::new(); articles.len()];
        for (index, headline) in completed {
            headlines[index] = headline;
        }

        Ok(articles
            .iter()
            .zip(headlines)
            .map(|(article, headline)| ArticleSummary {
                headline,
                url: article.url.clone(),
                source: article.source.clone(),
                title: article.title.clone(),
                description: article.description.clone(),
            })
            .collect())
    }

    /// On-demand detailed explanation for a single article, from
    /// caller-supplied fields.
    pub async fn article_detail(
        &self,
        ticker: &str,
        company_name: &str,
        title: &str,
        description: &str,
        price_change: f64,
    ) -> Result<String, WatchError> {
        let model = self.model()?;

        let prompt = format!(
            "Explain in exactly 3 to 5 plain sentences (no bullet points, no headers, \
             no markup) how this news about {company} ({ticker}) is likely to affect the \
             stock price, given today's {price_change:+.2}% move.\n\n\
             Headline: {title}\n\
             Details: {description}",
            company = sanitize(company_name),
            ticker = sanitize(ticker),
            title = sanitize(title),
            description = sanitize(description),
        );

        let text = model.complete(&prompt, DETAIL_MAX_TOKENS).await?;
        Ok(text.trim().to_string())
    }

    /// One-line explanation of the day's move, fusing price, sentiment, and
    /// the top headlines. Missing price data short-circuits to a fixed
    /// message without calling the model.
    pub async fn daily_rationale(
        &self,
        ticker: &str,
        quote: Option<&PriceQuote>,
        overall_sentiment: Sentiment,
        top_titles: &[String],
    ) -> Result<DailyRationale, WatchError> {
        let model = self.model()?;

        let quote = match quote {
            Some(q) => q,
            None => {
                return Ok(DailyRationale {
                    ticker: ticker.to_string(),
                    daily_summary: MARKET_DATA_UNAVAILABLE.to_string(),
                })
            }
        };

        let headlines = if top_titles.is_empty() {
            "(no fresh headlines)".to_string()
        } else {
            top_titles
                .iter()
                .take(3)
                .enumerate()
                .map(|(i, t)| format!("{}. {}", i + 1, sanitize(t)))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let prompt = format!(
            "{ticker} stock moved {change:+.2}% today to ${price:.2}. \
             Overall news sentiment is {sentiment}.\n\n\
             Top headlines:\n{headlines}\n\n\
             In ONE sentence of at most 12 words, explain today's move. \
             Respond with the sentence only.",
            ticker = sanitize(ticker),
            change = quote.change_percent,
            price = quote.current_price,
            sentiment = overall_sentiment.as_str(),
        );

        let text = model.complete(&prompt, RATIONALE_MAX_TOKENS).await?;

        Ok(DailyRationale {
            ticker: ticker.to_string(),
            daily_summary: one_line(&text),
        })
    }
}

/// Collapse a model answer to a single trimmed line.
fn one_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeModel {
        reply: String,
        fail_marker: Option<String>,
        calls: AtomicUsize,
    }

    impl FakeModel {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                fail_marker: None,
                calls: AtomicUsize::new(0),
            })
        }

        fn failing_on(reply: &str, marker: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                fail_marker: Some(marker.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TextModel for FakeModel {
        async fn complete(&self, prompt: &str, _max_tokens: u32) -> Result<String, WatchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(marker) = &self.fail_marker {
                if prompt.contains(marker) {
                    return Err(WatchError::Upstream("model unavailable".to_string()));
                }
            }
            Ok(self.reply.clone())
        }
    }

    fn article(title: &str) -> Article {
        Article {
            title: title.to_string(),
            description: format!("{} details", title),
            url: format!("https://example.com/{}", title),
            published: "Mon, 25 Aug 2025 10:00:00 GMT".to_string(),
            source: "Example Wire".to_string(),
            image: None,
        }
    }

    fn quote(change: f64) -> PriceQuote {
        PriceQuote {
            ticker: "AAPL".to_string(),
            current_price: 102.0,
            change_percent: change,
        }
    }

    #[tokio::test]
    async fn test_missing_credential_fails_every_flow() {
        let engine = InsightEngine::unconfigured();

        let summary = engine.topic_summary("AAPL", "Apple", &[]).await;
        assert!(matches!(summary, Err(WatchError::MissingApiKey)));

        let sentiment = engine.sentiment("AAPL", "Apple", &[], None).await;
        assert!(matches!(sentiment, Err(WatchError::MissingApiKey)));

        let rationale = engine
            .daily_rationale("AAPL", None, Sentiment::Neutral, &[])
            .await;
        assert!(matches!(rationale, Err(WatchError::MissingApiKey)));
    }

    #[tokio::test]
    async fn test_topic_summary_short_circuits_without_articles() {
        let model = FakeModel::replying("should not be used");
        let engine = InsightEngine::with_model(model.clone());

        let summary = engine.topic_summary("AAPL", "Apple", &[]).await.unwrap();
        assert_eq!(summary, NO_RECENT_NEWS);
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_price_only_sentiment_skips_model() {
        let model = FakeModel::replying("OVERALL: bearish");
        let engine = InsightEngine::with_model(model.clone());

        let up = engine
            .sentiment("AAPL", "Apple", &[], Some(&quote(2.5)))
            .await
            .unwrap();
        assert_eq!(up.overall, Sentiment::Bullish);
        assert!(up.per_article.is_empty());

        let down = engine
            .sentiment("AAPL", "Apple", &[], Some(&quote(-1.0)))
            .await
            .unwrap();
        assert_eq!(down.overall, Sentiment::Bearish);

        let flat = engine
            .sentiment("AAPL", "Apple", &[], Some(&quote(0.0)))
            .await
            .unwrap();
        assert_eq!(flat.overall, Sentiment::Neutral);

        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_no_news_no_price_is_neutral() {
        let model = FakeModel::replying("unused");
        let engine = InsightEngine::with_model(model.clone());

        let result = engine.sentiment("AAPL", "Apple", &[], None).await.unwrap();
        assert_eq!(result.overall, Sentiment::Neutral);
        assert!(result.per_article.is_empty());
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_sentiment_parses_model_protocol() {
        let model = FakeModel::replying("OVERALL: bullish\nARTICLES: 1:bullish garbage 3:bearish");
        let engine = InsightEngine::with_model(model.clone());
        let articles = vec![article("a"), article("b"), article("c")];

        let result = engine
            .sentiment("AAPL", "Apple", &articles, Some(&quote(1.0)))
            .await
            .unwrap();

        assert_eq!(result.overall, Sentiment::Bullish);
        assert_eq!(
            result.per_article,
            vec![Sentiment::Bullish, Sentiment::Neutral, Sentiment::Bearish]
        );
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn test_fanout_isolates_single_failure() {
        // The prompt for the failing article contains its title.
        let model = FakeModel::failing_on("A crisp headline.", "beta");
        let engine = InsightEngine::with_model(model.clone());
        let articles = vec![article("alpha"), article("beta"), article("gamma")];

        let summaries = engine
            .article_summaries("AAPL", "Apple", &articles)
            .await
            .unwrap();

        assert_eq!(summaries.len(), 3);
        assert_eq!(summaries[0].headline, "A crisp headline.");
        assert_eq!(summaries[1].headline, HEADLINE_UNAVAILABLE);
        assert_eq!(summaries[2].headline, "A crisp headline.");
        // Alignment by position: urls follow the input order.
        assert_eq!(summaries[1].url, "https://example.com/beta");
        assert_eq!(model.calls(), 3);
    }

    #[tokio::test]
    async fn test_article_detail_uses_caller_fields() {
        let model = FakeModel::replying("First. Second. Third.");
        let engine = InsightEngine::with_model(model.clone());

        let detail = engine
            .article_detail("AAPL", "Apple", "Chip launch", "New silicon", 1.2)
            .await
            .unwrap();
        assert_eq!(detail, "First. Second. Third.");
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn test_rationale_without_price_skips_model() {
        let model = FakeModel::replying("unused");
        let engine = InsightEngine::with_model(model.clone());

        let rationale = engine
            .daily_rationale("AAPL", None, Sentiment::Bullish, &[])
            .await
            .unwrap();
        assert_eq!(rationale.daily_summary, MARKET_DATA_UNAVAILABLE);
        assert_eq!(rationale.ticker, "AAPL");
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_rationale_collapses_to_one_line() {
        let model = FakeModel::replying("  Shares rose on strong\nearnings momentum.  ");
        let engine = InsightEngine::with_model(model.clone());

        let rationale = engine
            .daily_rationale(
                "AAPL",
                Some(&quote(2.0)),
                Sentiment::Bullish,
                &["Earnings beat".to_string()],
            )
            .await
            .unwrap();
        assert_eq!(
            rationale.daily_summary,
            "Shares rose on strong earnings momentum."
        );
        assert_eq!(model.calls(), 1);
    }
}
