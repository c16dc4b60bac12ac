//! Feed transport: fetching and parsing RSS/Atom sources.
//!
//! One [`FeedClient`] serves every configured source. A fetch downloads the
//! document, tries RSS 2.0 first and Atom second, and truncates to the N
//! most recent entries in the feed's own order (feeds publish newest-first).
//! Fetch attempts run under the shared [`RetryPolicy`]; a source that still
//! fails afterwards is the Collector's problem, not this module's.

use crate::api::RetryPolicy;
use crate::config::FeedSpec;
use crate::errors::FetchError;
use crate::models::RawEntry;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Trait for fetching one feed source.
///
/// The seam lets Collector tests script feed contents without a network.
pub trait FetchFeed {
    /// Fetch a feed and return at most `max_entries` raw entries, in the
    /// feed's native order.
    async fn fetch(&self, feed: &FeedSpec, max_entries: usize)
    -> Result<Vec<RawEntry>, FetchError>;
}

/// HTTP-backed feed fetcher.
pub struct FeedClient {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl FeedClient {
    /// Build a client with a bounded request timeout and descriptive
    /// User-Agent (some feed CDNs reject anonymous clients).
    pub fn new(retry: RetryPolicy) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(concat!("news_locator/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, retry })
    }

    async fn fetch_once(
        &self,
        feed: &FeedSpec,
        max_entries: usize,
    ) -> Result<Vec<RawEntry>, FetchError> {
        let response = self.client.get(&feed.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: feed.url.clone(),
            });
        }

        let body = response.bytes().await?;
        parse_feed_capped(&body, &feed.url, max_entries)
    }
}

impl FetchFeed for FeedClient {
    #[instrument(level = "info", skip_all, fields(source = %feed.name, url = %feed.url))]
    async fn fetch(
        &self,
        feed: &FeedSpec,
        max_entries: usize,
    ) -> Result<Vec<RawEntry>, FetchError> {
        let entries = self
            .retry
            .run("fetch feed", || self.fetch_once(feed, max_entries))
            .await?;

        info!(source = %feed.name, count = entries.len(), "Fetched feed");
        Ok(entries)
    }
}

/// Parse a feed body and keep at most `max_entries` of its most recent
/// entries, preserving the feed's own order (feeds publish newest-first).
///
/// This is the whole of what a fetch does after the HTTP exchange.
fn parse_feed_capped(
    body: &[u8],
    url: &str,
    max_entries: usize,
) -> Result<Vec<RawEntry>, FetchError> {
    let mut entries = parse_feed_document(body, url)?;
    let native = entries.len();
    entries.truncate(max_entries);
    debug!(url, native, kept = entries.len(), "Parsed feed body");
    Ok(entries)
}

/// Parse a feed document body, trying RSS 2.0 first, then Atom.
pub fn parse_feed_document(body: &[u8], url: &str) -> Result<Vec<RawEntry>, FetchError> {
    if let Ok(channel) = rss::Channel::read_from(body) {
        debug!(url, "Parsed as RSS");
        return Ok(parse_rss_channel(&channel));
    }

    if let Ok(feed) = atom_syndication::Feed::read_from(body) {
        debug!(url, "Parsed as Atom");
        return Ok(parse_atom_feed(&feed));
    }

    Err(FetchError::UnrecognizedFormat {
        url: url.to_string(),
    })
}

fn parse_rss_channel(channel: &rss::Channel) -> Vec<RawEntry> {
    channel
        .items()
        .iter()
        .map(|item| {
            // content:encoded carries the fuller text when present
            let description = item
                .content()
                .or_else(|| item.description())
                .unwrap_or_default()
                .to_string();

            RawEntry {
                title: item.title().unwrap_or_default().to_string(),
                link: item.link().unwrap_or_default().to_string(),
                description,
                categories: item
                    .categories()
                    .iter()
                    .map(|c| c.name().to_string())
                    .collect(),
            }
        })
        .collect()
}

fn parse_atom_feed(feed: &atom_syndication::Feed) -> Vec<RawEntry> {
    feed.entries()
        .iter()
        .map(|entry| {
            let link = entry
                .links()
                .first()
                .map(|l| l.href().to_string())
                .unwrap_or_default();

            let description = entry
                .content()
                .and_then(|c| c.value())
                .map(str::to_string)
                .or_else(|| entry.summary().map(|s| s.to_string()))
                .unwrap_or_default();

            RawEntry {
                title: entry.title().to_string(),
                link,
                description,
                categories: entry
                    .categories()
                    .iter()
                    .map(|c| c.term().to_string())
                    .collect(),
            }
        })
        .collect()
}
