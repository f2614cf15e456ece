//! Tag input parsing.

use hasker_common::{AppError, AppResult};

/// Maximum number of tags on one question.
pub const MAX_TAGS: usize = 3;

/// Maximum length of one tag, in characters.
pub const MAX_TAG_LEN: usize = 32;

/// Parse comma-separated tag input.
///
/// Entries are trimmed, empty ones dropped and repeats collapsed.
pub fn parse_tags(input: &str) -> AppResult<Vec<String>> {
    let mut tags: Vec<String> = Vec::new();
    for raw in input.split(',') {
        let text = raw.trim();
        if text.is_empty() || tags.iter().any(|t| t == text) {
            continue;
        }
        if text.chars().count() > MAX_TAG_LEN {
            return Err(AppError::Validation(format!(
                "Tag \"{text}\" is longer than {MAX_TAG_LEN} characters"
            )));
        }
        tags.push(text.to_string());
    }

    if tags.len() > MAX_TAGS {
        return Err(AppError::Validation(format!(
            "Provided more than {MAX_TAGS} tags"
        )));
    }

    Ok(tags)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_tags_trims_and_drops_empty() {
        assert_eq!(
            parse_tags(" rust , async,, ").unwrap(),
            vec!["rust".to_string(), "async".to_string()]
        );
        assert!(parse_tags("").unwrap().is_empty());
        assert!(parse_tags(" , ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_tags_collapses_repeats() {
        assert_eq!(parse_tags("a, a, b, a").unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_parse_tags_rejects_more_than_three() {
        assert!(matches!(
            parse_tags("a, b, c, d"),
            Err(AppError::Validation(_))
        ));
        assert_eq!(parse_tags("a, b, c").unwrap().len(), 3);
    }

    #[test]
    fn test_parse_tags_rejects_long_tag() {
        let long = "x".repeat(MAX_TAG_LEN + 1);
        assert!(parse_tags(&long).is_err());
        assert!(parse_tags(&"x".repeat(MAX_TAG_LEN)).is_ok());
    }

    proptest! {
        #[test]
        fn prop_parsed_tags_are_bounded(input in "[a-z ,]{0,40}") {
            if let Ok(tags) = parse_tags(&input) {
                prop_assert!(tags.len() <= MAX_TAGS);
                for tag in &tags {
                    prop_assert!(!tag.is_empty());
                    prop_assert_eq!(tag.trim(), tag.as_str());
                }
            }
        }
    }
}
