use lazy_static::lazy_static;
use regex::Regex;

use crate::error::HeadlineError;

lazy_static! {
    // Marker, optional whitespace, then everything up to the next comma
    // (whitespace before the comma excluded) or the end of the text.
    static ref RE_HEADLINE: Regex = Regex::new(r"(?s)Headline:\s*(.*?)(?:\s*,|\z)").expect("static regex");
}

/// Headline following the first `Headline:` marker in `text`.
///
/// The capture stops before the next comma (or at end of text). Whitespace
/// between the marker and the headline, and before the terminating comma, is
/// not part of the result; trailing whitespace at the end of the text is kept.
pub fn extract_headline(text: &str) -> Result<String, HeadlineError> {
    RE_HEADLINE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or(HeadlineError::NotFound)
}

/// Every marker's headline, in text order.
pub fn extract_headlines(text: &str) -> Vec<String> {
    RE_HEADLINE
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_at_first_comma() {
        assert_eq!(
            extract_headline("Headline: Markets rally, investors cheer").unwrap(),
            "Markets rally"
        );
    }

    #[test]
    fn test_runs_to_end_without_comma() {
        assert_eq!(extract_headline("Headline:   Fed holds rates").unwrap(), "Fed holds rates");
    }

    #[test]
    fn test_trailing_whitespace_kept_only_without_comma() {
        assert_eq!(extract_headline("Headline: Fed holds rates  ").unwrap(), "Fed holds rates  ");
        assert_eq!(extract_headline("Headline: Fed holds rates  , later").unwrap(), "Fed holds rates");
    }

    #[test]
    fn test_marker_mid_text() {
        let text = "Source: Wire. Headline: Chipmaker beats estimates , shares up";
        assert_eq!(extract_headline(text).unwrap(), "Chipmaker beats estimates");
    }

    #[test]
    fn test_missing_marker_is_not_found() {
        assert_eq!(extract_headline("Shares were flat today."), Err(HeadlineError::NotFound));
        assert_eq!(extract_headline(""), Err(HeadlineError::NotFound));
    }

    #[test]
    fn test_empty_headline_still_matches() {
        assert_eq!(extract_headline("Headline:, nothing").unwrap(), "");
    }

    #[test]
    fn test_multiple_markers() {
        let text = "Headline: One, a. Headline: Two, b. Headline: Three";
        assert_eq!(extract_headlines(text), vec!["One", "Two", "Three"]);
    }
}
