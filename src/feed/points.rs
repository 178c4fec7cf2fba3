// src/feed/points.rs
//! The feed has no structured score field; the count only appears inside the
//! HTML description as e.g. `<p>Points: 123</p>`.

use once_cell::sync::OnceCell;
use regex::Regex;

use crate::error::{BotError, BotResult};

/// Extract the popularity count following the `points:` label (case-insensitive).
/// The value runs up to the next `<` or the end of the text.
pub fn extract_points(description: &str) -> BotResult<u64> {
    static RE_POINTS: OnceCell<Regex> = OnceCell::new();
    let re = RE_POINTS.get_or_init(|| Regex::new(r"(?i)points:([^<]*)").unwrap());

    let caps = re
        .captures(description)
        .ok_or_else(|| BotError::malformed("description has no \"points:\" label"))?;
    let raw = caps.get(1).map(|m| m.as_str()).unwrap_or_default().trim();

    raw.parse::<u64>()
        .map_err(|_| BotError::malformed(format!("points value {raw:?} is not a non-negative integer")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HNRSS_DESC: &str = "\n<p>Article URL: <a href=\"https://example.com/a\">https://example.com/a</a></p>\n<p>Comments URL: <a href=\"https://news.ycombinator.com/item?id=1\">https://news.ycombinator.com/item?id=1</a></p>\n<p>Points: 142</p>\n<p># Comments: 37</p>\n";

    #[test]
    fn reads_value_up_to_markup_boundary() {
        assert_eq!(extract_points(HNRSS_DESC).unwrap(), 142);
    }

    #[test]
    fn label_is_case_insensitive_and_end_of_text_terminates() {
        assert_eq!(extract_points("points: 7").unwrap(), 7);
        assert_eq!(extract_points("POINTS:0").unwrap(), 0);
    }

    #[test]
    fn missing_label_is_malformed() {
        let err = extract_points("<p># Comments: 3</p>").unwrap_err();
        assert!(matches!(err, BotError::MalformedFeedItem { .. }));
    }

    #[test]
    fn non_numeric_or_negative_is_malformed() {
        for desc in ["<p>Points: lots</p>", "<p>Points: -4</p>", "<p>Points: </p>", "Points: 12.5"] {
            let err = extract_points(desc).unwrap_err();
            assert!(
                matches!(err, BotError::MalformedFeedItem { .. }),
                "{desc} should be malformed"
            );
        }
    }
}
