//! Freshness filtering for raw feed entries.
//!
//! Feed recency filters are coarse and unreliable, so the strict cutoff is
//! enforced here: entries must parse to an instant strictly newer than the
//! cutoff. Entries whose published date fails to parse are dropped rather
//! than failing the request. Source order is preserved and accumulation
//! stops at the cap; no sorting by recency or relevance.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::debug;

use watch_core::{Article, RawEntry};

/// Permissive publication-date parser. Feed dates show up as RFC 2822
/// (Google News), RFC 3339, or a bare naive timestamp.
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    DateTime::parse_from_rfc2822(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
        })
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .map(|naive| naive.and_utc())
                .ok()
        })
}

/// Keep entries strictly newer than `cutoff`, in source order, up to `cap`.
pub fn filter_fresh(entries: &[RawEntry], cutoff: DateTime<Utc>, cap: usize) -> Vec<Article> {
    let mut articles = Vec::with_capacity(cap);

    for entry in entries {
        if articles.len() >= cap {
            break;
        }

        let published = match parse_published(&entry.published) {
            Some(ts) => ts,
            None => {
                debug!("Dropping entry with unparseable date: {:?}", entry.published);
                continue;
            }
        };

        if published <= cutoff {
            continue;
        }

        articles.push(Article {
            title: entry.title.clone(),
            description: entry.summary.clone(),
            url: entry.link.clone(),
            published: entry.published.clone(),
            source: entry.source.clone(),
            image: resolve_image(entry),
        });
    }

    articles
}

/// Best-effort image metadata: prefer the embedded media attachment, else
/// the first link whose declared MIME type is an image. Never a filtering
/// criterion.
fn resolve_image(entry: &RawEntry) -> Option<String> {
    if let Some(url) = &entry.media_url {
        return Some(url.clone());
    }

    entry
        .links
        .iter()
        .find(|link| {
            link.mime_type
                .as_deref()
                .is_some_and(|mime| mime.starts_with("image/"))
        })
        .map(|link| link.href.clone())
}
