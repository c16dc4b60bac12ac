//! Batch classification of articles against the LLM.
//!
//! One request covers a whole batch. The prompt lists every article with its
//! link, title, description, and categories, and demands a JSON array with
//! exactly one object per article keyed by link. The completion text is
//! untrusted: the payload is located, parsed into typed rows, and checked
//! against the batch's link set before anything is merged. A response that
//! misses an article, answers twice for one, or invents an unknown link
//! fails the whole batch — misattributing cities to the wrong article is
//! worse than reporting nothing for the batch.

use crate::api::{ChatBackend, RetryPolicy};
use crate::errors::ClassifyError;
use crate::models::{Article, ClassificationResult};
use crate::utils::{extract_json_array, truncate_for_log};
use itertools::Itertools;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use tracing::{debug, instrument};

/// Response-token budget per article in the batch.
const TOKENS_PER_ARTICLE: u32 = 500;

/// Trait for classifying one batch of articles.
///
/// The Analyzer drives the pipeline through this seam, so batch-failure
/// handling is testable with a scripted classifier.
pub trait Classify {
    /// Classify a batch, returning one result per distinct link.
    async fn classify(
        &self,
        batch: &[Article],
    ) -> Result<HashMap<String, ClassificationResult>, ClassifyError>;
}

/// One row of the classifier's JSON array response.
///
/// Unknown extra fields are ignored; models decorate. Field types themselves
/// are enforced by serde.
#[derive(Debug, Deserialize)]
struct ResponseRow {
    link: String,
    #[serde(default)]
    cities: Vec<String>,
    #[serde(default)]
    rationale: String,
}

/// LLM-backed batch classifier.
pub struct BatchClassifier<B> {
    backend: B,
    retry: RetryPolicy,
}

impl<B: ChatBackend> BatchClassifier<B> {
    pub fn new(backend: B, retry: RetryPolicy) -> Self {
        Self { backend, retry }
    }

    async fn attempt(
        &self,
        prompt: &str,
        batch: &[Article],
        max_tokens: u32,
    ) -> Result<HashMap<String, ClassificationResult>, ClassifyError> {
        let content = self.backend.complete(prompt, max_tokens).await?;
        debug!(
            response_preview = %truncate_for_log(&content, 300),
            "Received completion"
        );
        parse_response(batch, &content)
    }
}

impl<B: ChatBackend> Classify for BatchClassifier<B> {
    #[instrument(level = "info", skip_all, fields(batch_len = batch.len()))]
    async fn classify(
        &self,
        batch: &[Article],
    ) -> Result<HashMap<String, ClassificationResult>, ClassifyError> {
        let prompt = build_prompt(batch);
        let max_tokens = TOKENS_PER_ARTICLE * batch.len() as u32;

        self.retry
            .run("classify batch", || {
                self.attempt(&prompt, batch, max_tokens)
            })
            .await
    }
}

/// Build the classification prompt for one batch.
fn build_prompt(batch: &[Article]) -> String {
    let mut articles_block = String::new();
    for (i, article) in batch.iter().enumerate() {
        let _ = write!(
            articles_block,
            "{n}. Link: {link}\n   Title: {title}\n   Description: {description}\n   Categories: {categories}\n",
            n = i + 1,
            link = article.link,
            title = article.title,
            description = article.description,
            categories = article.categories.join(", "),
        );
    }

    format!(
        r#"You are a geographic analysis expert specializing in identifying cities mentioned in news articles.

TASK:
Analyze each of the following news articles and identify which cities are mentioned or directly related to its content.

ARTICLES:
{articles_block}
INSTRUCTIONS:
1. For each article, identify all cities explicitly mentioned in it.
2. Also identify cities that are strongly implied or directly related to the content.
3. If no cities are explicitly mentioned, make an educated guess about which cities might be related based on context clues.
4. Do NOT include countries, regions, states, or other non-city locations.
5. Provide a rationale for each article explaining why these cities are mentioned or related.
6. Only when it is impossible to make any reasonable guess, return an empty cities list for that article and say so in the rationale.

RESPONSE FORMAT:
Respond with a valid JSON array containing exactly one object per article above. Each object must carry the article's link verbatim:
[
  {{"link": "<link of the article>", "cities": ["City1", "City2"], "rationale": "Your explanation"}}
]
Do not answer for any link that is not listed above, and do not answer for the same link twice."#
    )
}

/// Parse and validate a completion against the batch it answers.
fn parse_response(
    batch: &[Article],
    content: &str,
) -> Result<HashMap<String, ClassificationResult>, ClassifyError> {
    let payload = extract_json_array(content).ok_or(ClassifyError::MissingPayload)?;
    let rows: Vec<ResponseRow> = serde_json::from_str(&payload)?;

    // Duplicate links within the batch share one result, so validation runs
    // on the distinct link set.
    let expected: HashSet<&str> = batch.iter().map(|a| a.link.as_str()).collect();

    let duplicated: Vec<&str> = rows
        .iter()
        .map(|r| r.link.as_str())
        .duplicates()
        .collect();
    if !duplicated.is_empty() {
        return Err(ClassifyError::LinkMismatch {
            detail: format!("duplicated {duplicated:?}"),
        });
    }

    let answered: HashSet<&str> = rows.iter().map(|r| r.link.as_str()).collect();
    let missing: Vec<&&str> = expected.difference(&answered).sorted().collect();
    let unknown: Vec<&&str> = answered.difference(&expected).sorted().collect();
    if !missing.is_empty() || !unknown.is_empty() {
        return Err(ClassifyError::LinkMismatch {
            detail: format!("missing {missing:?}, unknown {unknown:?}"),
        });
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            (
                row.link,
                ClassificationResult {
                    cities: row.cities,
                    rationale: row.rationale,
                },
            )
        })
        .collect())
}
