//! Utility functions for HTML stripping, response payload extraction, pacing,
//! and file system checks.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use std::fs as stdfs;
use std::time::Duration;
use tokio::fs;
use tokio::time::sleep;
use tracing::{debug, info, instrument};

/// Strip HTML markup from a string, returning plain text.
///
/// Entities are decoded and whitespace is collapsed to single spaces, so
/// `<p>a&amp;b</p>\n<p>c</p>` becomes `a&b c`.
///
/// # Arguments
///
/// * `html` - The possibly-HTML string, e.g. a feed description
///
/// # Returns
///
/// The text content with normalized whitespace. Plain-text input passes
/// through unchanged (modulo whitespace collapsing).
pub fn strip_html(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }
    let fragment = Html::parse_fragment(html);
    let text = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

static FENCED_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").unwrap());

/// Extract the JSON array payload from an LLM completion.
///
/// Models wrap their answer unpredictably: sometimes a fenced ```json block,
/// sometimes a bare array with prose around it. A fenced block is unwrapped
/// when present; otherwise the outermost `[...]` span is taken positionally.
///
/// # Arguments
///
/// * `text` - The raw assistant message content
///
/// # Returns
///
/// The candidate JSON array text, or `None` if no array-shaped span exists.
/// The caller still has to parse and validate the result — this only locates
/// the payload.
pub fn extract_json_array(text: &str) -> Option<String> {
    if let Some(caps) = FENCED_BLOCK.captures(text) {
        let inner = caps[1].trim();
        if inner.starts_with('[') {
            return Some(inner.to_string());
        }
    }

    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end > start {
        Some(text[start..=end].to_string())
    } else {
        None
    }
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to at most `max` bytes with an ellipsis and
/// byte count indicator appended. The cut backs up to the nearest char
/// boundary, since completions routinely carry multibyte characters.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Pause between pipeline units (feed sources, classification batches).
///
/// The delays keep the run under the remote endpoints' rate limits. Modeled
/// as an explicit scheduling step so tests can configure zero and never
/// sleep.
pub async fn pause(secs: u64) {
    if secs == 0 {
        return;
    }
    debug!(secs, "Pausing before next unit");
    sleep(Duration::from_secs(secs)).await;
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then performs a write test by creating
/// and immediately deleting a probe file. Called for both artifact
/// directories before any network I/O so a bad path fails the run early.
///
/// # Errors
///
/// Returns the underlying I/O error if the directory cannot be created or is
/// not writable (permission denied, read-only filesystem, etc.).
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), std::io::Error> {
    fs::create_dir_all(path).await?;
    // Try a small sync write using std fs (simpler error surface)
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}
