//! Analysis driver: batching, classification, merge, persistence.
//!
//! Drives `partition → classify → merge` across all batches with the
//! inter-batch pause between them. Merging is by `link`, never by position.
//! A batch that fails after retries flags its articles instead of aborting
//! the run: every collected Article appears exactly once in the final
//! output, classified or flagged. Nothing is persisted until every batch has
//! been decided, so an interrupted run leaves no partial analysis artifact.

use crate::batch::partition;
use crate::classifier::Classify;
use crate::config::LocatorConfig;
use crate::errors::RunError;
use crate::models::{AnalysisStats, Article};
use crate::outputs::json::write_article_artifact;
use crate::utils::pause;
use tracing::{info, instrument, warn};

/// Prefix of the rationale attached to articles whose batch failed.
const FAILURE_PREFIX: &str = "classification failed";

/// Classify every collected article and persist the annotated sequence.
///
/// Persists to `<output_dir>/analysis_<YYYY-MM-DD>.json` after the last
/// batch.
///
/// # Arguments
///
/// * `classifier` - The batch classifier (mockable through [`Classify`])
/// * `articles` - The ordered collection to annotate
/// * `config` - Run configuration (batch size, inter-batch delay)
/// * `output_dir` - Directory for the analysis artifact
///
/// # Returns
///
/// The annotated articles, in collection order, plus batch failure counts.
#[instrument(level = "info", skip_all, fields(count = articles.len()))]
pub async fn analyze_locations<C: Classify>(
    classifier: &C,
    articles: Vec<Article>,
    config: &LocatorConfig,
    output_dir: &str,
) -> Result<(Vec<Article>, AnalysisStats), RunError> {
    let batches = partition(articles, config.batch_size)?;
    let mut stats = AnalysisStats {
        batches_total: batches.len(),
        batches_failed: 0,
    };

    let batch_count = batches.len();
    let mut annotated: Vec<Article> = Vec::new();

    for (i, mut batch) in batches.into_iter().enumerate() {
        info!(batch = i + 1, of = batch_count, len = batch.len(), "Classifying batch");

        match classifier.classify(&batch).await {
            Ok(results) => {
                for article in &mut batch {
                    match results.get(&article.link) {
                        Some(result) => {
                            article.cities = result.cities.clone();
                            article.rationale = result.rationale.clone();
                        }
                        // Unreachable after integrity validation; flagged
                        // anyway so the article is never silently dropped.
                        None => flag_failed(article, "link missing from response"),
                    }
                }
            }
            Err(e) => {
                stats.batches_failed += 1;
                warn!(batch = i + 1, error = %e, "Batch failed; flagging its articles");
                let reason = e.to_string();
                for article in &mut batch {
                    flag_failed(article, &reason);
                }
            }
        }

        annotated.append(&mut batch);

        if i + 1 < batch_count {
            pause(config.inter_batch_delay_secs).await;
        }
    }

    let path = write_article_artifact(output_dir, "analysis", &annotated).await?;
    info!(
        count = annotated.len(),
        batches = stats.batches_total,
        batches_failed = stats.batches_failed,
        path = %path,
        "Analysis complete"
    );

    Ok((annotated, stats))
}

fn flag_failed(article: &mut Article, reason: &str) {
    article.cities = Vec::new();
    article.rationale = format!("{FAILURE_PREFIX}: {reason}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ApiError, ClassifyError};
    use crate::models::ClassificationResult;
    use std::cell::Cell;
    use std::collections::HashMap;

    /// Classifier that answers every article with its own title as the city,
    /// optionally failing on scripted batch indexes.
    struct ScriptedClassifier {
        fail_on_batches: Vec<usize>,
        batches_seen: Cell<usize>,
    }

    impl ScriptedClassifier {
        fn new(fail_on_batches: Vec<usize>) -> Self {
            Self {
                fail_on_batches,
                batches_seen: Cell::new(0),
            }
        }
    }

    impl Classify for ScriptedClassifier {
        async fn classify(
            &self,
            batch: &[Article],
        ) -> Result<HashMap<String, ClassificationResult>, ClassifyError> {
            let index = self.batches_seen.get();
            self.batches_seen.set(index + 1);

            if self.fail_on_batches.contains(&index) {
                return Err(ClassifyError::Api(ApiError::Status {
                    status: 503,
                    message: "unavailable".to_string(),
                }));
            }

            Ok(batch
                .iter()
                .map(|a| {
                    (
                        a.link.clone(),
                        ClassificationResult {
                            cities: vec![format!("City of {}", a.title)],
                            rationale: format!("because of {}", a.title),
                        },
                    )
                })
                .collect())
        }
    }

    fn articles(n: usize) -> Vec<Article> {
        (0..n)
            .map(|i| Article {
                title: format!("Article {i}"),
                description: String::new(),
                link: format!("https://example.com/{i}"),
                categories: vec![],
                source: "test".to_string(),
                cities: vec![],
                rationale: String::new(),
            })
            .collect()
    }

    fn config() -> LocatorConfig {
        LocatorConfig {
            batch_size: 3,
            inter_batch_delay_secs: 0,
            ..LocatorConfig::default()
        }
    }

    #[tokio::test]
    async fn test_all_batches_succeed() {
        let classifier = ScriptedClassifier::new(vec![]);
        let dir = tempfile::tempdir().unwrap();

        let (annotated, stats) =
            analyze_locations(&classifier, articles(7), &config(), dir.path().to_str().unwrap())
                .await
                .unwrap();

        assert_eq!(annotated.len(), 7);
        assert_eq!(stats.batches_total, 3);
        assert_eq!(stats.batches_failed, 0);
        for (i, article) in annotated.iter().enumerate() {
            assert_eq!(article.cities, vec![format!("City of Article {i}")]);
            assert_eq!(article.rationale, format!("because of Article {i}"));
        }
    }

    #[tokio::test]
    async fn test_failed_batch_is_flagged_not_dropped() {
        // Batch 2 of 3 (articles 3..6) fails.
        let classifier = ScriptedClassifier::new(vec![1]);
        let dir = tempfile::tempdir().unwrap();

        let (annotated, stats) =
            analyze_locations(&classifier, articles(7), &config(), dir.path().to_str().unwrap())
                .await
                .unwrap();

        assert_eq!(annotated.len(), 7);
        assert_eq!(stats.batches_failed, 1);

        for article in &annotated[3..6] {
            assert!(article.cities.is_empty());
            assert!(article.rationale.starts_with("classification failed:"));
        }
        for article in annotated[..3].iter().chain(&annotated[6..]) {
            assert!(!article.cities.is_empty());
        }
    }

    #[tokio::test]
    async fn test_merge_completeness_and_order() {
        let classifier = ScriptedClassifier::new(vec![0, 2]);
        let input = articles(8);
        let links: Vec<String> = input.iter().map(|a| a.link.clone()).collect();
        let dir = tempfile::tempdir().unwrap();

        let (annotated, _) =
            analyze_locations(&classifier, input, &config(), dir.path().to_str().unwrap())
                .await
                .unwrap();

        let out_links: Vec<String> = annotated.iter().map(|a| a.link.clone()).collect();
        assert_eq!(out_links, links);
    }

    #[tokio::test]
    async fn test_empty_collection_still_writes_artifact() {
        let classifier = ScriptedClassifier::new(vec![]);
        let dir = tempfile::tempdir().unwrap();

        let (annotated, stats) =
            analyze_locations(&classifier, vec![], &config(), dir.path().to_str().unwrap())
                .await
                .unwrap();

        assert!(annotated.is_empty());
        assert_eq!(stats.batches_total, 0);

        let date = chrono::Local::now().date_naive();
        let path = dir.path().join(format!("analysis_{date}.json"));
        assert!(path.is_file());
    }

    #[tokio::test]
    async fn test_analysis_artifact_matches_returned_articles() {
        let classifier = ScriptedClassifier::new(vec![]);
        let dir = tempfile::tempdir().unwrap();

        let (annotated, _) =
            analyze_locations(&classifier, articles(4), &config(), dir.path().to_str().unwrap())
                .await
                .unwrap();

        let date = chrono::Local::now().date_naive();
        let raw = std::fs::read_to_string(dir.path().join(format!("analysis_{date}.json"))).unwrap();
        let persisted: Vec<Article> = serde_json::from_str(&raw).unwrap();
        assert_eq!(persisted, annotated);
    }
}
