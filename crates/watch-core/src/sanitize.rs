//! Prompt sanitization for external and user-influenced strings.
//!
//! Every company name, ticker, article title, and article description is
//! passed through [`sanitize`] before it is interpolated into a model
//! prompt. This blocks prompt injection smuggled through feed content or
//! watchlist fields, so it is a security invariant rather than formatting.

/// Maximum length of any single sanitized field inside a prompt.
pub const MAX_PROMPT_FIELD_LEN: usize = 500;

/// Total function: never fails, empty input maps to an empty string.
///
/// Strips ASCII control characters (0x00-0x1F, 0x7F), collapses literal
/// backslash-escaped newline sequences (`\n`, `\r` spelled out as two
/// characters) to single spaces, and truncates to
/// [`MAX_PROMPT_FIELD_LEN`] characters. Idempotent.
pub fn sanitize(input: &str) -> String {
    let stripped: String = input.chars().filter(|c| !c.is_ascii_control()).collect();
    let collapsed = stripped.replace("\\n", " ").replace("\\r", " ");
    collapsed.chars().take(MAX_PROMPT_FIELD_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn test_strips_control_characters() {
        let out = sanitize("hello\x00wor\x1fld\x7f!");
        assert_eq!(out, "helloworld!");
        assert!(out.chars().all(|c| !c.is_ascii_control()));
    }

    #[test]
    fn test_collapses_escaped_newlines() {
        assert_eq!(sanitize(r"line one\nline two\rend"), "line one line two end");
    }

    #[test]
    fn test_real_newlines_are_control_chars() {
        assert_eq!(sanitize("a\nb\rc"), "abc");
    }

    #[test]
    fn test_truncates_to_limit() {
        let long = "x".repeat(2000);
        assert_eq!(sanitize(&long).len(), MAX_PROMPT_FIELD_LEN);
    }

    #[test]
    fn test_idempotent() {
        let cases = [
            "plain text",
            r"smuggled\ninjection\r attempt",
            "ctrl\x01then\\\x02n literal",
            &"y".repeat(1200),
        ];
        for case in cases {
            let once = sanitize(case);
            assert_eq!(sanitize(&once), once, "not idempotent for {case:?}");
        }
    }
}
