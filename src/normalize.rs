//! Article normalization: turning a raw feed entry into the canonical record.
//!
//! Pure and deterministic, no I/O. The one validity rule lives here: an entry
//! without a link cannot be joined to a classification result later, so it is
//! rejected outright rather than propagated as a partial Article.

use crate::errors::NormalizeError;
use crate::models::{Article, RawEntry};
use crate::utils::strip_html;

/// Normalize a raw feed entry into an [`Article`].
///
/// Mapping: entry title → `title`; entry summary/description, HTML-stripped
/// to plain text → `description`; entry permalink → `link`; entry tags →
/// `categories` (order preserved, not deduplicated); `source` passed through
/// as-is. `cities` and `rationale` start empty; the Analyzer fills them.
///
/// # Errors
///
/// [`NormalizeError::MissingLink`] when the entry has no permalink.
pub fn normalize(entry: &RawEntry, source: &str) -> Result<Article, NormalizeError> {
    if entry.link.trim().is_empty() {
        return Err(NormalizeError::MissingLink {
            title: entry.title.clone(),
        });
    }

    Ok(Article {
        title: entry.title.clone(),
        description: strip_html(&entry.description),
        link: entry.link.clone(),
        categories: entry.categories.clone(),
        source: source.to_string(),
        cities: Vec::new(),
        rationale: String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> RawEntry {
        RawEntry {
            title: "Wildfire spreads north of Sacramento".to_string(),
            link: "https://example.com/wildfire".to_string(),
            description: "<p>Crews battle flames as <b>evacuations</b> begin.</p>".to_string(),
            categories: vec!["us".to_string(), "weather".to_string(), "us".to_string()],
        }
    }

    #[test]
    fn test_field_mapping() {
        let article = normalize(&entry(), "fox_news").unwrap();
        assert_eq!(article.title, "Wildfire spreads north of Sacramento");
        assert_eq!(article.link, "https://example.com/wildfire");
        assert_eq!(article.description, "Crews battle flames as evacuations begin.");
        assert_eq!(article.source, "fox_news");
        assert!(article.cities.is_empty());
        assert!(article.rationale.is_empty());
    }

    #[test]
    fn test_categories_keep_order_and_duplicates() {
        let article = normalize(&entry(), "fox_news").unwrap();
        assert_eq!(
            article.categories,
            vec!["us".to_string(), "weather".to_string(), "us".to_string()]
        );
    }

    #[test]
    fn test_missing_link_is_rejected() {
        let mut bad = entry();
        bad.link = String::new();
        let err = normalize(&bad, "fox_news").unwrap_err();
        assert!(matches!(err, NormalizeError::MissingLink { .. }));

        bad.link = "   ".to_string();
        assert!(normalize(&bad, "fox_news").is_err());
    }

    #[test]
    fn test_idempotent() {
        let e = entry();
        let first = normalize(&e, "fox_news").unwrap();
        let second = normalize(&e, "fox_news").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_description_allowed() {
        let mut e = entry();
        e.description = String::new();
        let article = normalize(&e, "fox_news").unwrap();
        assert_eq!(article.description, "");
    }
}
