//! Data models for collected articles and their classification results.
//!
//! This module defines the core data structures used throughout the pipeline:
//! - [`RawEntry`]: A feed entry as the FeedSource adapter emits it, before normalization
//! - [`Article`]: The canonical article record, persisted raw and annotated
//! - [`ClassificationResult`]: The per-article city analysis, keyed by link
//! - [`CollectionStats`] / [`AnalysisStats`]: Counters surfaced in the end-of-run summary
//!
//! `Article` serializes to the artifact schema
//! `{title, description, link, categories, source, cities, rationale}`.

use serde::{Deserialize, Serialize};

/// A feed entry as parsed out of an RSS or Atom document.
///
/// Fields the feed omits map to empty strings/vectors; whether the entry is
/// usable at all is the Normalizer's decision, not the adapter's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    /// The entry title.
    pub title: String,
    /// The entry permalink. Empty when the feed omits it.
    pub link: String,
    /// The entry summary or content. May contain HTML markup.
    pub description: String,
    /// Feed-provided taxonomy tags, in feed order.
    pub categories: Vec<String>,
}

/// A news article flowing through the pipeline.
///
/// Born normalized-but-unclassified (empty `cities` and `rationale`), then
/// annotated exactly once by the Analyzer. `link` is the join key used to
/// merge classification results back onto the record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Article {
    /// The article title/headline.
    pub title: String,
    /// Plain-text summary of the article (HTML stripped by the Normalizer).
    pub description: String,
    /// The article permalink. Non-empty; enforced by the Normalizer.
    pub link: String,
    /// Feed-provided taxonomy tags, order preserved.
    pub categories: Vec<String>,
    /// Identifier of the originating feed (the configured source name).
    pub source: String,
    /// Cities the article concerns, populated by classification.
    /// An empty vector is a valid final state (no city found).
    #[serde(default)]
    pub cities: Vec<String>,
    /// The classifier's explanation, populated together with `cities`.
    #[serde(default)]
    pub rationale: String,
}

/// The classifier's verdict for one article, keyed by the article's link.
///
/// Transient: produced by the Classifier Client, consumed by the Analyzer's
/// merge step, never persisted on its own.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClassificationResult {
    /// Cities the article mentions or directly relates to. May be empty.
    #[serde(default)]
    pub cities: Vec<String>,
    /// Free-text explanation for the city list. May be empty.
    #[serde(default)]
    pub rationale: String,
}

/// Counters the Collector accumulates across feed sources.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CollectionStats {
    /// Feed sources the run attempted to fetch.
    pub sources_attempted: usize,
    /// Sources skipped because the fetch failed after retries.
    pub sources_failed: usize,
    /// Entries dropped because they could not become Articles.
    pub entries_dropped: usize,
}

/// Counters the Analyzer accumulates across classification batches.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisStats {
    /// Batches the run attempted to classify.
    pub batches_total: usize,
    /// Batches whose articles were flagged failed-classification.
    pub batches_failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_article() -> Article {
        Article {
            title: "London faces flooding risk as Thames barrier tested".to_string(),
            description: "The UK capital prepares for potential flooding.".to_string(),
            link: "https://example.com/london-flooding".to_string(),
            categories: vec!["uk".to_string(), "environment".to_string()],
            source: "fox_news".to_string(),
            cities: vec![],
            rationale: String::new(),
        }
    }

    #[test]
    fn test_article_serializes_to_artifact_schema() {
        let json = serde_json::to_value(sample_article()).unwrap();
        let obj = json.as_object().unwrap();

        let mut keys: Vec<&str> = obj.keys().map(|k| k.as_str()).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec![
                "categories",
                "cities",
                "description",
                "link",
                "rationale",
                "source",
                "title"
            ]
        );
        assert_eq!(obj["cities"], serde_json::json!([]));
        assert_eq!(obj["rationale"], serde_json::json!(""));
    }

    #[test]
    fn test_article_roundtrip() {
        let mut article = sample_article();
        article.cities = vec!["London".to_string()];
        article.rationale = "The UK capital is named in the title.".to_string();

        let json = serde_json::to_string(&article).unwrap();
        let back: Article = serde_json::from_str(&json).unwrap();
        assert_eq!(back, article);
    }

    #[test]
    fn test_article_deserializes_without_classification_fields() {
        // Raw artifacts written before analysis still parse.
        let json = r#"{
            "title": "t",
            "description": "d",
            "link": "https://example.com/a",
            "categories": [],
            "source": "fox_news"
        }"#;

        let article: Article = serde_json::from_str(json).unwrap();
        assert!(article.cities.is_empty());
        assert!(article.rationale.is_empty());
    }

    #[test]
    fn test_classification_result_defaults() {
        let result: ClassificationResult = serde_json::from_str("{}").unwrap();
        assert!(result.cities.is_empty());
        assert!(result.rationale.is_empty());
    }
}
