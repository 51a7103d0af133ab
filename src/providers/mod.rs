/*!
 * Translation service clients.
 *
 * This module contains client implementations for the supported services:
 * - Google: the public web translation endpoint
 * - LibreTranslate: self-hosted or public LibreTranslate servers
 * - Mock: deterministic in-process service used by tests
 */

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{RequestBuilder, Response, StatusCode};
use std::fmt::Debug;
use std::time::Duration;

use crate::errors::ProviderError;

pub mod google;
pub mod libretranslate;
pub mod mock;

pub use google::GoogleTranslate;
pub use libretranslate::LibreTranslate;
pub use mock::{MockBehavior, MockProvider};

/// Common trait for all translation services
///
/// A `None` result means the service answered without a usable translation.
/// Callers decide what to do with it; clients never substitute text.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Short service name used in logs
    fn name(&self) -> &str;

    /// Translate a single string
    ///
    /// # Arguments
    /// * `text` - Text to translate
    /// * `source_language` - ISO 639-1 code or `auto`
    /// * `target_language` - ISO 639-1 code
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<Option<String>, ProviderError>;

    /// Translate several strings, position for position
    ///
    /// The default sends one request per text. An element without a usable
    /// translation comes back empty.
    async fn translate_batch(
        &self,
        texts: &[String],
        source_language: &str,
        target_language: &str,
    ) -> Result<Option<Vec<String>>, ProviderError> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            let translated = self.translate(text, source_language, target_language).await?;
            results.push(translated.unwrap_or_default());
        }
        Ok(Some(results))
    }

    /// Sequential request rounds one `translate_batch` of `batch_len` texts
    /// takes; the gateway allows one call timeout per round
    fn batch_round_trips(&self, batch_len: usize) -> usize {
        batch_len.max(1)
    }

    /// Check that the service is reachable
    async fn test_connection(&self) -> Result<(), ProviderError>;
}

/// Retry and pacing settings shared by the HTTP clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts after the first request
    pub max_retries: u32,
    /// Base backoff time in milliseconds, doubled on each retry
    pub backoff_base_ms: u64,
    /// Optional rate limit in requests per minute
    pub rate_limit: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base_ms: 1000,
            rate_limit: None,
        }
    }
}

impl RetryPolicy {
    /// Delay before a given retry attempt (1-based)
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.backoff_base_ms.saturating_mul(1 << shift))
    }

    /// Pacing delay derived from the requests-per-minute limit
    pub fn pacing_delay(&self) -> Option<Duration> {
        self.rate_limit
            .filter(|rpm| *rpm > 0)
            .map(|rpm| Duration::from_millis(60_000 / rpm as u64))
    }

    /// Send a request, retrying network errors, 429 and 5xx responses
    ///
    /// `build` is called once per attempt since a `RequestBuilder` is consumed
    /// by sending it.
    pub async fn send<F>(&self, service: &str, build: F) -> Result<Response, ProviderError>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let mut attempt = 0;
        let mut last_error = ProviderError::RequestFailed(format!("{} request was not sent", service));

        while attempt <= self.max_retries {
            if attempt > 0 {
                let delay = self.backoff_delay(attempt).max(self.pacing_delay().unwrap_or_default());
                debug!("{} retry {}/{} in {:?}", service, attempt, self.max_retries, delay);
                tokio::time::sleep(delay).await;
            }

            match build().send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }

                    let message = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Failed to get error response text".to_string());
                    let error = status_error(status, message);
                    if !is_retryable(status) {
                        return Err(error);
                    }
                    warn!("{} request failed with {} (attempt {})", service, status, attempt + 1);
                    last_error = error;
                }
                Err(e) => {
                    warn!("{} request error (attempt {}): {}", service, attempt + 1, e);
                    last_error = if e.is_connect() || e.is_timeout() {
                        ProviderError::ConnectionError(e.to_string())
                    } else {
                        ProviderError::RequestFailed(e.to_string())
                    };
                }
            }
            attempt += 1;
        }

        Err(last_error)
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn status_error(status: StatusCode, message: String) -> ProviderError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimitExceeded(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::AuthenticationError(message),
        _ => ProviderError::ApiError {
            status_code: status.as_u16(),
            message,
        },
    }
}
