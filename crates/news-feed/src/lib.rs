//! News search over the Google News RSS API.
//!
//! The adapter normalizes feed items into [`RawEntry`] records and resolves
//! the feed's optional attributes (media attachments, typed links) once at
//! this boundary. It never propagates transport failures: the pipeline must
//! degrade to "no news", not crash, when the feed is unreachable.
//!
//! The `when:{n}d` recency hint is a coarse pre-filter only; the strict
//! 24-hour cutoff is enforced downstream by [`filter::filter_fresh`].

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{info, warn};

use watch_core::{EntryLink, NewsSearcher, RawEntry};

pub mod filter;
pub use filter::{filter_fresh, parse_published};

const BASE_URL: &str = "https://news.google.com/rss/search";

#[derive(Clone)]
pub struct GoogleNewsClient {
    client: Client,
}

impl GoogleNewsClient {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent("Mozilla/5.0 (compatible; StockWatch/0.1)")
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client }
    }

    async fn fetch_feed(&self, query: &str, window_days: u32) -> Result<Vec<RawEntry>, String> {
        let search = format!("{} when:{}d", query, window_days);
        let url = format!(
            "{}?q={}&hl=en-US&gl=US&ceid=US:en",
            BASE_URL,
            urlencoding::encode(&search)
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("Google News returned status {}", response.status()));
        }

        let content = response.bytes().await.map_err(|e| e.to_string())?;

        let channel = rss::Channel::read_from(&content[..])
            .map_err(|e| format!("RSS parse error: {}", e))?;

        Ok(channel.items().iter().filter_map(entry_from_item).collect())
    }
}

impl Default for GoogleNewsClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NewsSearcher for GoogleNewsClient {
    async fn search(&self, query: &str, window_days: u32) -> Vec<RawEntry> {
        match self.fetch_feed(query, window_days).await {
            Ok(entries) => {
                info!(
                    "Google News search '{}' ({}d window): {} entries",
                    query,
                    window_days,
                    entries.len()
                );
                entries
            }
            Err(e) => {
                warn!("Google News search '{}' failed: {}", query, e);
                Vec::new()
            }
        }
    }
}

/// Normalize one RSS item. Items without a title or link are useless and
/// dropped here.
fn entry_from_item(item: &rss::Item) -> Option<RawEntry> {
    let raw_title = item.title()?.to_string();
    let link = item.link()?.to_string();

    // Google News appends the outlet to the title as "Title - Source" and
    // also carries a <source> element; prefer the element.
    let (title, title_source) = split_source_suffix(&raw_title);
    let source = item
        .source()
        .and_then(|s| s.title().map(str::to_string))
        .unwrap_or(title_source);

    let summary = item.description().map(strip_html).unwrap_or_default();
    let published = item.pub_date().unwrap_or_default().to_string();

    // Media attachment, when the feed carries one (media RSS namespace).
    let media_url = item
        .extensions()
        .get("media")
        .and_then(|m| m.get("content"))
        .and_then(|contents| contents.first())
        .and_then(|content| content.attrs().get("url"))
        .cloned();

    let mut links = vec![EntryLink {
        href: link.clone(),
        mime_type: None,
    }];
    if let Some(enclosure) = item.enclosure() {
        links.push(EntryLink {
            href: enclosure.url().to_string(),
            mime_type: Some(enclosure.mime_type().to_string()),
        });
    }

    Some(RawEntry {
        title,
        summary,
        link,
        published,
        source,
        media_url,
        links,
    })
}

/// Split the "Article Title - Source Name" suffix Google News uses.
fn split_source_suffix(title: &str) -> (String, String) {
    match title.rfind(" - ") {
        Some(pos) => (
            title[..pos].trim().to_string(),
            title[pos + 3..].trim().to_string(),
        ),
        None => (title.to_string(), "Unknown".to_string()),
    }
}

fn strip_html(html: &str) -> String {
    let mut result = String::new();
    let mut in_tag = false;

    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }

    result
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_source_suffix() {
        let (title, source) = split_source_suffix("Apple unveils new chip - Reuters");
        assert_eq!(title, "Apple unveils new chip");
        assert_eq!(source, "Reuters");
    }

    #[test]
    fn test_split_source_suffix_absent() {
        let (title, source) = split_source_suffix("Apple unveils new chip");
        assert_eq!(title, "Apple unveils new chip");
        assert_eq!(source, "Unknown");
    }

    #[test]
    fn test_strip_html() {
        let out = strip_html("<p>Apple &amp; the <b>chip</b> race</p>");
        assert_eq!(out, "Apple & the chip race");
    }
}
