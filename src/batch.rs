//! Batch partitioning for classification requests.
//!
//! One classification request covers a whole batch of articles, which is the
//! pipeline's primary cost-control mechanism; this module owns the split.

use crate::errors::ConfigError;
use crate::models::Article;
use itertools::Itertools;

/// Partition articles into ordered, contiguous batches of `batch_size`.
///
/// Yields `ceil(len / batch_size)` batches, all full except possibly the
/// last; concatenating them reproduces the input exactly. Pure and
/// deterministic.
///
/// # Errors
///
/// [`ConfigError::ZeroBatchSize`] when `batch_size` is zero. Config
/// validation rejects this earlier; the guard here keeps the function total.
pub fn partition(articles: Vec<Article>, batch_size: usize) -> Result<Vec<Vec<Article>>, ConfigError> {
    if batch_size == 0 {
        return Err(ConfigError::ZeroBatchSize);
    }

    let chunks = articles.into_iter().chunks(batch_size);
    let batches = chunks.into_iter().map(|chunk| chunk.collect()).collect();
    Ok(batches)
}
