//! Chat-completion transport and exponential backoff retry logic.
//!
//! This module provides the raw HTTP exchange with an OpenAI-compatible LLM
//! API, plus the retry discipline shared by every remote call the pipeline
//! makes.
//!
//! # Architecture
//!
//! The module uses a trait-based design for flexibility:
//! - [`ChatBackend`]: Core trait defining the chat-completion call
//! - [`ChatClient`]: `reqwest`-backed implementation against `/chat/completions`
//! - [`RetryPolicy`]: An explicit policy object (attempt ceiling, base delay,
//!   cap, jitter) that wraps any retryable async operation
//!
//! Keeping the policy a value rather than control flow means the backoff
//! behavior is independently testable, and a zero-delay policy turns retries
//! into no-sleep loops for tests.
//!
//! # Retry Strategy
//!
//! - Bounded attempts (configured per run, default 3)
//! - Exponential backoff starting at 1 second
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd
//! - Errors declare their own transience via [`Retryable`]; a non-retryable
//!   error fails on the first attempt

use crate::errors::{ApiError, Retryable};
use rand::{rng, Rng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, instrument, warn};

/// Trait for the chat-completion call.
///
/// Implementors send a prompt to an LLM and return the assistant's text.
/// The seam exists so the classification layer can be driven by canned
/// responses in tests.
pub trait ChatBackend {
    /// Send a prompt and return the assistant message content.
    ///
    /// # Arguments
    ///
    /// * `prompt` - The full prompt text, sent as a single system message
    /// * `max_tokens` - Response token budget for this request
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, ApiError>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: String,
}

/// Client for an OpenAI-compatible chat-completion endpoint.
///
/// One instance per run; the underlying `reqwest` client carries a 30 second
/// request timeout so a hung endpoint costs at most one timeout per attempt.
pub struct ChatClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl ChatClient {
    /// Low temperature keeps the classification output stable across runs.
    const TEMPERATURE: f32 = 0.1;

    /// Create a client for the given endpoint.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Endpoint base, e.g. `https://api.deepseek.com/v1`
    ///   (trailing slash tolerated)
    /// * `api_key` - Bearer token sent with every request
    /// * `model` - Model identifier, e.g. `deepseek-chat`
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("news_locator/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }
}

impl fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // api_key deliberately omitted
        f.debug_struct("ChatClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl ChatBackend for ChatClient {
    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, ApiError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "system",
                content: prompt,
            }],
            temperature: Self::TEMPERATURE,
            max_tokens,
        };

        let t0 = Instant::now();
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(
                status = status.as_u16(),
                elapsed_ms = t0.elapsed().as_millis() as u64,
                "Chat completion returned an error status"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatResponse = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(ApiError::EmptyCompletion)?;
        if content.trim().is_empty() {
            return Err(ApiError::EmptyCompletion);
        }

        Ok(content)
    }
}

/// Exponential backoff retry policy for remote calls.
///
/// The delay between attempts follows:
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..max_jitter)
/// ```
///
/// The policy consults [`Retryable::is_retryable`] on each failure, so
/// authentication errors and other permanent failures surface immediately
/// instead of burning attempts.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempt ceiling, including the first try. At least 1.
    max_attempts: usize,
    /// Initial delay between attempts (doubles each time).
    base_delay: Duration,
    /// Delay cap to prevent excessive waiting.
    max_delay: Duration,
    /// Upper bound for the random jitter added to each delay.
    max_jitter_ms: u64,
}

impl RetryPolicy {
    /// Production policy: 1s base delay, 30s cap, up to 250ms jitter.
    pub fn new(max_attempts: usize) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_jitter_ms: 250,
        }
    }

    /// Policy that never sleeps. For tests.
    pub fn no_delay(max_attempts: usize) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            max_jitter_ms: 0,
        }
    }

    fn backoff(&self, attempt: usize) -> Duration {
        let mut delay = self.base_delay.saturating_mul(1 << (attempt - 1).min(31));
        if delay > self.max_delay {
            delay = self.max_delay;
        }
        if self.max_jitter_ms > 0 {
            let jitter_ms: u64 = rng().random_range(0..=self.max_jitter_ms);
            delay += Duration::from_millis(jitter_ms);
        }
        delay
    }

    /// Run `op` until it succeeds, fails permanently, or exhausts attempts.
    ///
    /// # Arguments
    ///
    /// * `what` - Short operation label for the log
    /// * `op` - Factory producing one attempt's future per call
    ///
    /// # Returns
    ///
    /// The first success, or the last error observed.
    pub async fn run<T, E, F, Fut>(&self, what: &str, mut op: F) -> Result<T, E>
    where
        E: Retryable + fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let total_t0 = Instant::now();
        let mut attempt = 1usize;

        loop {
            let attempt_t0 = Instant::now();
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if !e.is_retryable() {
                        error!(
                            what,
                            attempt,
                            elapsed_ms_attempt = attempt_dt.as_millis() as u64,
                            error = %e,
                            "Permanent failure; not retrying"
                        );
                        return Err(e);
                    }
                    if attempt >= self.max_attempts {
                        error!(
                            what,
                            attempt,
                            max = self.max_attempts,
                            elapsed_ms_total = total_dt.as_millis() as u64,
                            error = %e,
                            "Exhausted retries"
                        );
                        return Err(e);
                    }

                    let delay = self.backoff(attempt);
                    warn!(
                        what,
                        attempt,
                        max = self.max_attempts,
                        elapsed_ms_attempt = attempt_dt.as_millis() as u64,
                        ?delay,
                        error = %e,
                        "Attempt failed; backing off"
                    );
                    if !delay.is_zero() {
                        sleep(delay).await;
                    }
                    attempt += 1;
                }
            }
        }
    }
}
