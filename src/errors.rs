//! Error types for the collection and classification pipeline.
//!
//! Failures are typed by the unit they take down, so callers can isolate
//! them at the right boundary instead of aborting the whole run:
//!
//! | Family | Failing unit | Run impact |
//! |--------|--------------|------------|
//! | [`ConfigError`] | the run | aborts before any I/O |
//! | [`FetchError`] | one feed source | source skipped, recorded |
//! | [`NormalizeError`] | one feed entry | entry dropped, counted |
//! | [`ApiError`] / [`ClassifyError`] | one batch | batch flagged as failed |
//! | [`ArtifactError`] | the output file | aborts (nothing useful was written) |

use thiserror::Error;

/// Implemented by error families the retry policy may re-attempt.
pub trait Retryable {
    /// Whether another attempt could plausibly produce a different outcome.
    fn is_retryable(&self) -> bool;
}

/// Failure fetching or parsing one feed source.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// The body parsed as neither RSS 2.0 nor Atom. Retried because CDNs
    /// occasionally serve truncated or interstitial bodies with a 200.
    #[error("{url} returned a document that is neither RSS nor Atom")]
    UnrecognizedFormat { url: String },
}

impl Retryable for FetchError {
    fn is_retryable(&self) -> bool {
        match self {
            FetchError::Http(_) => true,
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            FetchError::UnrecognizedFormat { .. } => true,
        }
    }
}

/// A feed entry that cannot become an article.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("entry {title:?} has no link")]
    MissingLink { title: String },
}

/// Invalid or unusable run configuration. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("batch_size must be at least 1")]
    ZeroBatchSize,

    #[error("max_attempts must be at least 1")]
    ZeroAttempts,

    #[error("no feed sources configured")]
    NoFeeds,

    #[error("feed {name:?} has an invalid url {url:?}: {source}")]
    BadFeedUrl {
        name: String,
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("classifier API key is not set (pass --api-key or set DEEPSEEK_API_KEY)")]
    MissingApiKey,
}

/// Transport-level failure talking to the chat-completion endpoint.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("completion contained no choices")]
    EmptyCompletion,
}

impl Retryable for ApiError {
    fn is_retryable(&self) -> bool {
        match self {
            ApiError::Http(_) => true,
            // 401/403 and other client errors will not clear up on their own.
            ApiError::Status { status, .. } => *status == 429 || *status >= 500,
            ApiError::EmptyCompletion => true,
        }
    }
}

/// Failure classifying one batch of articles.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("no JSON array found in classifier response")]
    MissingPayload,

    #[error("malformed classifier response: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    /// The response's link set does not match the batch. Treated as a
    /// whole-batch failure: attributing cities to the wrong article is worse
    /// than reporting nothing for the batch.
    #[error("response does not cover the batch: {detail}")]
    LinkMismatch { detail: String },
}

impl Retryable for ClassifyError {
    fn is_retryable(&self) -> bool {
        match self {
            ClassifyError::Api(e) => e.is_retryable(),
            // The model occasionally emits a short or garbled completion; a
            // fresh attempt usually parses.
            ClassifyError::MissingPayload
            | ClassifyError::MalformedPayload(_)
            | ClassifyError::LinkMismatch { .. } => true,
        }
    }
}

/// Failure serializing or writing a persistence artifact.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("cannot serialize articles: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Umbrella for the failures that abort a run driver (Collector/Analyzer).
///
/// Per-unit failures never reach this type; they are isolated and logged at
/// their own boundary.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}
