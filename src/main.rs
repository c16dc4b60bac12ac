//! # News Locator
//!
//! A batch pipeline that collects recent article summaries from RSS/Atom
//! feeds and determines, for each article, which city or cities it concerns,
//! using an LLM classifier.
//!
//! ## Features
//!
//! - Collects capped, ordered entries from any number of configured feeds
//! - Classifies articles in batches through an OpenAI-compatible chat API,
//!   with exponential backoff and rate-limit pacing
//! - Isolates failures: a dead feed, a malformed entry, or a failed batch
//!   never aborts the run
//! - Persists a dated raw artifact and a dated analysis artifact as JSON
//!
//! ## Usage
//!
//! ```sh
//! DEEPSEEK_API_KEY=sk-... news_locator -d ./data -o ./output
//! ```
//!
//! ## Architecture
//!
//! One run is a single sequential pipeline:
//! 1. **Collection**: fetch and normalize each configured feed, one at a time
//! 2. **Analysis**: partition into batches, classify one batch at a time,
//!    merge results back by link
//! 3. **Output**: write the annotated article array to the analysis artifact

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod analyzer;
mod api;
mod batch;
mod classifier;
mod cli;
mod collector;
mod config;
mod errors;
mod feeds;
mod models;
mod normalize;
mod outputs;
mod utils;

use analyzer::analyze_locations;
use api::{ChatClient, RetryPolicy};
use classifier::BatchClassifier;
use cli::Cli;
use collector::collect_articles;
use config::LocatorConfig;
use errors::ConfigError;
use feeds::FeedClient;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_locator starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.data_dir, ?args.output_dir, ?args.config, "Parsed CLI arguments");

    // ---- Load and validate configuration (before any I/O) ----
    let config = match &args.config {
        Some(path) => LocatorConfig::load(path)?,
        None => {
            info!("No config file given; using built-in defaults");
            LocatorConfig::default()
        }
    };
    config.validate()?;

    let api_key = args.api_key.as_deref().filter(|k| !k.is_empty());
    let api_key = match api_key {
        Some(key) => key,
        None => {
            let e = ConfigError::MissingApiKey;
            error!(error = %e, "Refusing to start without a classifier key");
            return Err(e.into());
        }
    };

    // Early check: ensure both artifact directories are writable
    for dir in [&args.data_dir, &args.output_dir] {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(
                path = %dir,
                error = %e,
                "Artifact directory is not writable (fix perms or choose a different path)"
            );
            return Err(e.into());
        }
    }

    // ---- Collection ----
    info!(
        sources = config.feeds.len(),
        cap = config.max_articles_per_feed,
        "Collecting articles"
    );
    let retry = RetryPolicy::new(config.max_attempts);
    let feed_client = FeedClient::new(retry.clone())?;
    let (articles, collection_stats) =
        collect_articles(&feed_client, &config, &args.data_dir).await?;
    info!(count = articles.len(), "Collection finished");

    // ---- Analysis ----
    info!(
        batch_size = config.batch_size,
        model = %config.model,
        "Analyzing articles for city mentions"
    );
    let chat_client = ChatClient::new(&config.api_base_url, api_key, &config.model)?;
    let classifier = BatchClassifier::new(chat_client, retry);
    let (annotated, analysis_stats) =
        analyze_locations(&classifier, articles, &config, &args.output_dir).await?;

    // ---- End-of-run summary ----
    let elapsed = start_time.elapsed();
    info!(
        articles = annotated.len(),
        sources_attempted = collection_stats.sources_attempted,
        sources_failed = collection_stats.sources_failed,
        entries_dropped = collection_stats.entries_dropped,
        batches = analysis_stats.batches_total,
        batches_failed = analysis_stats.batches_failed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
