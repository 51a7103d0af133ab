/*!
 * Client for LibreTranslate servers.
 *
 * LibreTranslate accepts either a single string or an array of strings in
 * `q`, which gives this client a native batch call.
 */

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use super::{Provider, RetryPolicy};
use crate::errors::ProviderError;

/// Default public server
pub const DEFAULT_LIBRETRANSLATE_ENDPOINT: &str = "https://libretranslate.com";

/// Text payload: one string or a batch
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
enum Payload {
    Single(String),
    Batch(Vec<String>),
}

/// Request body for `POST /translate`
#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: Payload,
    source: &'a str,
    target: &'a str,
    format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

/// Response body of `POST /translate`
#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: Option<Payload>,
    #[serde(default)]
    error: Option<String>,
}

/// LibreTranslate client
#[derive(Debug)]
pub struct LibreTranslate {
    /// Base URL of the server
    base_url: Url,
    /// API key, empty for servers that do not require one
    api_key: String,
    /// HTTP client for making requests
    client: Client,
    /// Retry and pacing settings
    retry: RetryPolicy,
}

impl LibreTranslate {
    /// Create a client for a server
    pub fn new(endpoint: &str, api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Self::new_with_config(endpoint, api_key, Duration::from_secs(30), RetryPolicy::default())
    }

    /// Create a client with explicit request timeout and retry policy
    pub fn new_with_config(
        endpoint: &str,
        api_key: impl Into<String>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, ProviderError> {
        let endpoint = if endpoint.trim().is_empty() {
            DEFAULT_LIBRETRANSLATE_ENDPOINT.to_string()
        } else {
            endpoint.trim().to_string()
        };
        // A trailing slash keeps Url::join from replacing the last path segment
        let endpoint = if endpoint.ends_with('/') {
            endpoint
        } else {
            format!("{}/", endpoint)
        };
        let base_url = Url::parse(&endpoint)
            .map_err(|e| ProviderError::RequestFailed(format!("Invalid endpoint '{}': {}", endpoint, e)))?;

        Ok(Self {
            base_url,
            api_key: api_key.into(),
            client: Client::builder()
                .timeout(timeout)
                .pool_idle_timeout(Duration::from_secs(90))
                .build()
                .unwrap_or_default(),
            retry,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ProviderError> {
        self.base_url
            .join(path)
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))
    }

    async fn post_translate(
        &self,
        q: Payload,
        source_language: &str,
        target_language: &str,
    ) -> Result<Option<Payload>, ProviderError> {
        let url = self.endpoint("translate")?;
        let request = TranslateRequest {
            q,
            source: source_language,
            target: target_language,
            format: "text",
            api_key: if self.api_key.is_empty() {
                None
            } else {
                Some(self.api_key.as_str())
            },
        };

        let response = self
            .retry
            .send("LibreTranslate", || self.client.post(url.clone()).json(&request))
            .await?;

        let body: TranslateResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        if let Some(error) = body.error {
            return Err(ProviderError::ApiError {
                status_code: 200,
                message: error,
            });
        }
        Ok(body.translated_text)
    }
}

#[async_trait]
impl Provider for LibreTranslate {
    fn name(&self) -> &str {
        "libretranslate"
    }

    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<Option<String>, ProviderError> {
        let result = self
            .post_translate(Payload::Single(text.to_string()), source_language, target_language)
            .await?;
        match result {
            Some(Payload::Single(translated)) if !translated.is_empty() => Ok(Some(translated)),
            Some(Payload::Batch(mut items)) if items.len() == 1 => Ok(items.pop().filter(|t| !t.is_empty())),
            _ => Ok(None),
        }
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        source_language: &str,
        target_language: &str,
    ) -> Result<Option<Vec<String>>, ProviderError> {
        if texts.is_empty() {
            return Ok(Some(Vec::new()));
        }
        let result = self
            .post_translate(Payload::Batch(texts.to_vec()), source_language, target_language)
            .await?;
        debug!("LibreTranslate batch of {} texts answered", texts.len());
        match result {
            Some(Payload::Batch(items)) => Ok(Some(items)),
            Some(Payload::Single(item)) => Ok(Some(vec![item])),
            None => Ok(None),
        }
    }

    fn batch_round_trips(&self, _batch_len: usize) -> usize {
        1
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let url = self.endpoint("languages")?;
        self.retry
            .send("LibreTranslate", || self.client.get(url.clone()))
            .await
            .map(|_| ())
    }
}
