//! Article collection across the configured feed sources.
//!
//! Sources are fetched strictly one at a time, in configured order, with the
//! inter-source pause between them to stay polite with feed CDNs. A source
//! that fails after retries is skipped and counted; a malformed entry is
//! dropped and counted; only the raw-artifact write can fail the collection.
//!
//! The output order is deterministic: configured source order, and within a
//! source, the feed's native order.

use crate::config::LocatorConfig;
use crate::errors::RunError;
use crate::feeds::FetchFeed;
use crate::models::{Article, CollectionStats};
use crate::normalize::normalize;
use crate::outputs::json::write_article_artifact;
use crate::utils::pause;
use tracing::{info, instrument, warn};

/// Collect articles from every configured feed source.
///
/// Persists the full ordered collection to
/// `<data_dir>/articles_<YYYY-MM-DD>.json` before returning.
///
/// # Arguments
///
/// * `feed_client` - The feed fetcher (mockable through [`FetchFeed`])
/// * `config` - Run configuration (feed list, cap, delays)
/// * `data_dir` - Directory for the raw artifact
///
/// # Returns
///
/// The ordered Article collection plus per-source/per-entry failure counts.
#[instrument(level = "info", skip_all, fields(sources = config.feeds.len()))]
pub async fn collect_articles<F: FetchFeed>(
    feed_client: &F,
    config: &LocatorConfig,
    data_dir: &str,
) -> Result<(Vec<Article>, CollectionStats), RunError> {
    let mut articles: Vec<Article> = Vec::new();
    let mut stats = CollectionStats::default();

    for (i, feed) in config.feeds.iter().enumerate() {
        stats.sources_attempted += 1;

        match feed_client.fetch(feed, config.max_articles_per_feed).await {
            Ok(entries) => {
                let mut kept = 0usize;
                for entry in &entries {
                    match normalize(entry, &feed.name) {
                        Ok(article) => {
                            articles.push(article);
                            kept += 1;
                        }
                        Err(e) => {
                            stats.entries_dropped += 1;
                            warn!(source = %feed.name, error = %e, "Dropping malformed entry");
                        }
                    }
                }
                info!(source = %feed.name, kept, dropped = entries.len() - kept, "Collected source");
            }
            Err(e) => {
                stats.sources_failed += 1;
                warn!(source = %feed.name, error = %e, "Skipping source after failed fetch");
            }
        }

        if i + 1 < config.feeds.len() {
            pause(config.inter_source_delay_secs).await;
        }
    }

    let path = write_article_artifact(data_dir, "articles", &articles).await?;
    info!(
        count = articles.len(),
        sources_failed = stats.sources_failed,
        entries_dropped = stats.entries_dropped,
        path = %path,
        "Collection complete"
    );

    Ok((articles, stats))
}
