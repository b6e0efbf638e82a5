//! Parser for the two-line sentiment wire protocol.
//!
//! The model is instructed to answer with exactly:
//!
//! ```text
//! OVERALL: <bullish|bearish|neutral>
//! ARTICLES: 1:<label> 2:<label> ...
//! ```
//!
//! Parsing is line-oriented and defensive. Unrecognized lines are ignored.
//! A malformed `index:label` token is skipped on its own; it never discards
//! the rest of the line. Indices are 1-based on the wire and out-of-range
//! indices are ignored. Positions never assigned a label stay `neutral`,
//! so `per_article.len()` always equals the input article count.

use watch_core::{Sentiment, SentimentResult};

pub fn parse_sentiment_response(text: &str, article_count: usize) -> SentimentResult {
    let mut overall = Sentiment::Neutral;
    let mut per_article = vec![Sentiment::Neutral; article_count];

    for line in text.lines() {
        let line = line.trim();

        if let Some(rest) = line.strip_prefix("OVERALL:") {
            if let Some(label) = Sentiment::parse_label(rest) {
                overall = label;
            }
        } else if let Some(rest) = line.strip_prefix("ARTICLES:") {
            for token in rest.split_whitespace() {
                let Some((index, label)) = token.split_once(':') else {
                    continue;
                };
                let Ok(index) = index.trim().parse::<usize>() else {
                    continue;
                };
                let Some(label) = Sentiment::parse_label(label) else {
                    continue;
                };
                if (1..=article_count).contains(&index) {
                    per_article[index - 1] = label;
                }
            }
        }
    }

    SentimentResult {
        overall,
        per_article,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_formed_response() {
        let result = parse_sentiment_response(
            "OVERALL: bullish\nARTICLES: 1:bullish 2:neutral 3:bearish",
            3,
        );
        assert_eq!(result.overall, Sentiment::Bullish);
        assert_eq!(
            result.per_article,
            vec![Sentiment::Bullish, Sentiment::Neutral, Sentiment::Bearish]
        );
    }

    #[test]
    fn test_malformed_token_is_skipped_alone() {
        let result = parse_sentiment_response(
            "OVERALL: bullish\nARTICLES: 1:bullish garbage 3:bearish",
            3,
        );
        assert_eq!(result.overall, Sentiment::Bullish);
        assert_eq!(
            result.per_article,
            vec![Sentiment::Bullish, Sentiment::Neutral, Sentiment::Bearish]
        );
    }

    #[test]
    fn test_out_of_range_indices_ignored() {
        let result = parse_sentiment_response("ARTICLES: 0:bullish 4:bearish 2:bullish", 3);
        assert_eq!(
            result.per_article,
            vec![Sentiment::Neutral, Sentiment::Bullish, Sentiment::Neutral]
        );
    }

    #[test]
    fn test_unknown_label_is_skipped() {
        let result = parse_sentiment_response("OVERALL: euphoric\nARTICLES: 1:meh 2:bearish", 2);
        assert_eq!(result.overall, Sentiment::Neutral);
        assert_eq!(
            result.per_article,
            vec![Sentiment::Neutral, Sentiment::Bearish]
        );
    }

    #[test]
    fn test_unrecognized_lines_ignored() {
        let result = parse_sentiment_response(
            "Here is my analysis:\nOVERALL: bearish\nARTICLES: 1:bearish\nHope that helps!",
            1,
        );
        assert_eq!(result.overall, Sentiment::Bearish);
        assert_eq!(result.per_article, vec![Sentiment::Bearish]);
    }

    #[test]
    fn test_length_invariant_holds_for_any_input() {
        for garbage in ["", "ARTICLES:", "ARTICLES: :::: a:b 99:bullish", "OVERALL:"] {
            let result = parse_sentiment_response(garbage, 4);
            assert_eq!(result.per_article.len(), 4);
        }
    }
}
