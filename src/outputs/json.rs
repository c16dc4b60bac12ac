//! Dated JSON artifact writing.
//!
//! Each run persists two artifacts: the raw collection
//! (`<data_dir>/articles_<YYYY-MM-DD>.json`) and the annotated analysis
//! (`<output_dir>/analysis_<YYYY-MM-DD>.json`), both pretty-printed ordered
//! arrays of Article objects.
//!
//! Writes go through a temp file in the same directory followed by a rename,
//! so an interrupted run never leaves a half-written artifact behind.

use crate::errors::ArtifactError;
use crate::models::Article;
use chrono::Local;
use tokio::fs;
use tracing::{info, instrument};

/// Write an article array to `<dir>/<stem>_<YYYY-MM-DD>.json` atomically.
///
/// Creates `dir` if needed. The date is the local date of the run.
///
/// # Arguments
///
/// * `dir` - Target directory
/// * `stem` - Artifact name prefix, `articles` or `analysis`
/// * `articles` - The ordered array to persist
///
/// # Returns
///
/// The path of the written artifact.
#[instrument(level = "info", skip(articles), fields(dir = %dir, stem = %stem))]
pub async fn write_article_artifact(
    dir: &str,
    stem: &str,
    articles: &[Article],
) -> Result<String, ArtifactError> {
    let json = serde_json::to_string_pretty(articles)?;

    fs::create_dir_all(dir).await?;

    let date = Local::now().date_naive();
    let path = format!("{}/{}_{}.json", dir.trim_end_matches('/'), stem, date);
    let tmp_path = format!("{path}.tmp");

    fs::write(&tmp_path, json).await?;
    fs::rename(&tmp_path, &path).await?;

    info!(path = %path, count = articles.len(), "Wrote artifact");
    Ok(path)
}
