/*!
 * Client for Google's public web translation endpoint.
 */

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use log::debug;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use super::{Provider, RetryPolicy};
use crate::errors::ProviderError;

/// Default endpoint used by the web translator
pub const DEFAULT_GOOGLE_ENDPOINT: &str = "https://translate.googleapis.com";

/// Longest text the endpoint accepts in one request
pub const GOOGLE_MAX_CHARS: usize = 5000;

/// Requests in flight for one batch; the endpoint has no batch call
const BATCH_CONCURRENCY: usize = 4;

/// Google web translation client
#[derive(Debug)]
pub struct GoogleTranslate {
    /// Base URL of the service
    base_url: Url,
    /// HTTP client for making requests
    client: Client,
    /// Retry and pacing settings
    retry: RetryPolicy,
}

impl GoogleTranslate {
    /// Create a client against the public endpoint with default settings
    pub fn new() -> Result<Self, ProviderError> {
        Self::new_with_config(DEFAULT_GOOGLE_ENDPOINT, Duration::from_secs(30), RetryPolicy::default())
    }

    /// Create a client with explicit endpoint, request timeout and retry policy
    pub fn new_with_config(endpoint: &str, timeout: Duration, retry: RetryPolicy) -> Result<Self, ProviderError> {
        let endpoint = if endpoint.trim().is_empty() {
            DEFAULT_GOOGLE_ENDPOINT
        } else {
            endpoint.trim()
        };
        let base_url = Url::parse(endpoint)
            .map_err(|e| ProviderError::RequestFailed(format!("Invalid endpoint '{}': {}", endpoint, e)))?;

        Ok(Self {
            base_url,
            client: Client::builder()
                .timeout(timeout)
                .pool_idle_timeout(Duration::from_secs(90))
                .build()
                .unwrap_or_default(),
            retry,
        })
    }

    fn translate_url(&self) -> Result<Url, ProviderError> {
        self.base_url
            .join("translate_a/single")
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))
    }

    /// Join the translated segments of a `translate_a/single` response
    ///
    /// The body is a nested array whose first element lists
    /// `[translated, original, ...]` segments.
    fn extract_text(body: &Value) -> Result<Option<String>, ProviderError> {
        let segments = body
            .get(0)
            .and_then(Value::as_array)
            .ok_or_else(|| ProviderError::ParseError("Response has no translation segments".to_string()))?;

        let text: String = segments
            .iter()
            .filter_map(|segment| segment.get(0).and_then(Value::as_str))
            .collect();

        Ok(if text.is_empty() { None } else { Some(text) })
    }
}

#[async_trait]
impl Provider for GoogleTranslate {
    fn name(&self) -> &str {
        "google"
    }

    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<Option<String>, ProviderError> {
        let length = text.chars().count();
        if length > GOOGLE_MAX_CHARS {
            return Err(ProviderError::TextTooLong {
                length,
                limit: GOOGLE_MAX_CHARS,
            });
        }

        let url = self.translate_url()?;
        let query = [
            ("client", "gtx"),
            ("sl", source_language),
            ("tl", target_language),
            ("dt", "t"),
            ("q", text),
        ];

        let response = self
            .retry
            .send("Google", || self.client.get(url.clone()).query(&query))
            .await?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        let translated = Self::extract_text(&body)?;
        debug!("Google translated {} chars to {}", length, target_language);
        Ok(translated)
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        source_language: &str,
        target_language: &str,
    ) -> Result<Option<Vec<String>>, ProviderError> {
        let results: Vec<Result<Option<String>, ProviderError>> = stream::iter(texts.iter().cloned())
            .map(|text| async move { self.translate(&text, source_language, target_language).await })
            .buffered(BATCH_CONCURRENCY)
            .collect()
            .await;

        let translated = results
            .into_iter()
            .map(|result| result.map(Option::unwrap_or_default))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(translated))
    }

    fn batch_round_trips(&self, batch_len: usize) -> usize {
        batch_len.div_ceil(BATCH_CONCURRENCY).max(1)
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        self.translate("Hello", "en", "hi").await.map(|_| ())
    }
}
