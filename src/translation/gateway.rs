/*!
 * Translation gateway.
 *
 * The gateway is the only place that talks to a translation service. It
 * never fails: whenever a call errors, times out or answers with nothing
 * usable, the original text comes back and the failure is logged and
 * recorded. Batch answers are accepted whole or not at all.
 */

use anyhow::{Context, Result};
use log::{debug, warn};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::cache::{TranslationCache, truncate_text};
use super::concurrency::ProviderProfile;
use crate::app_config::{Config, TranslationProvider};
use crate::language_utils::{SourceLanguage, TargetLanguage};
use crate::providers::{GoogleTranslate, LibreTranslate, Provider, RetryPolicy};

/// Default per-call timeout
///
/// A batch gets one such timeout per sequential request round the service
/// needs for it (see `Provider::batch_round_trips`).
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Why a call fell back to the original text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The service returned an error
    ServiceFailure,
    /// The call did not finish within the per-call timeout
    Timeout,
    /// The service answered without a usable translation
    EmptyResult,
    /// A batch answer was missing or had the wrong length
    BatchShapeMismatch,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ServiceFailure => "service failure",
            Self::Timeout => "timeout",
            Self::EmptyResult => "empty result",
            Self::BatchShapeMismatch => "batch shape mismatch",
        };
        f.write_str(name)
    }
}

/// One recorded fallback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    pub kind: FailureKind,
    pub detail: String,
}

/// Call counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GatewayStats {
    pub single_calls: usize,
    pub batch_calls: usize,
    pub failures: usize,
    pub cache_hits: usize,
}

/// Failure-absorbing front of a translation service
#[derive(Debug)]
pub struct TranslationGateway {
    provider: Arc<dyn Provider>,
    source: SourceLanguage,
    target: TargetLanguage,
    timeout: Duration,
    cache: TranslationCache,
    failures: Mutex<Vec<FailureRecord>>,
    single_calls: AtomicUsize,
    batch_calls: AtomicUsize,
    cache_hits: AtomicUsize,
}

impl TranslationGateway {
    /// Create a gateway over a service client
    pub fn new(provider: Arc<dyn Provider>, source: SourceLanguage, target: TargetLanguage) -> Self {
        Self {
            provider,
            source,
            target,
            timeout: DEFAULT_CALL_TIMEOUT,
            cache: TranslationCache::new(false),
            failures: Mutex::new(Vec::new()),
            single_calls: AtomicUsize::new(0),
            batch_calls: AtomicUsize::new(0),
            cache_hits: AtomicUsize::new(0),
        }
    }

    /// Set the per-call timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use a translation cache
    pub fn with_cache(mut self, cache: TranslationCache) -> Self {
        self.cache = cache;
        self
    }

    /// Build the gateway and service client selected in the configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let translation = &config.translation;
        let profile = ProviderProfile::for_provider(translation.provider);

        let retry = RetryPolicy {
            max_retries: translation.common.retry_count,
            backoff_base_ms: translation.common.retry_backoff_ms,
            rate_limit: translation.get_rate_limit().or(profile.target_rpm),
        };
        let http_timeout = Duration::from_secs(translation.get_timeout_secs());
        let endpoint = translation.get_endpoint();

        let provider: Arc<dyn Provider> = match translation.provider {
            TranslationProvider::Google => Arc::new(
                GoogleTranslate::new_with_config(&endpoint, http_timeout, retry)
                    .context("Failed to create Google client")?,
            ),
            TranslationProvider::LibreTranslate => Arc::new(
                LibreTranslate::new_with_config(&endpoint, translation.get_api_key(), http_timeout, retry)
                    .context("Failed to create LibreTranslate client")?,
            ),
        };

        Self::with_provider(config, provider)
    }

    /// Build a gateway over a given service client, taking languages, timeout
    /// and caching from the configuration
    pub fn with_provider(config: &Config, provider: Arc<dyn Provider>) -> Result<Self> {
        let source = config.source()?;
        let target = config.target()?;
        Ok(Self::new(provider, source, target)
            .with_timeout(Duration::from_secs(config.engine.timeout_secs.max(1)))
            .with_cache(TranslationCache::new(config.engine.cache_enabled)))
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn source_language(&self) -> &SourceLanguage {
        &self.source
    }

    pub fn target_language(&self) -> TargetLanguage {
        self.target
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Deadline for one batch call of `batch_len` texts
    pub fn batch_deadline(&self, batch_len: usize) -> Duration {
        let rounds = u32::try_from(self.provider.batch_round_trips(batch_len).max(1)).unwrap_or(u32::MAX);
        self.timeout.saturating_mul(rounds)
    }

    /// Check that the service is reachable
    pub async fn test_connection(&self) -> Result<()> {
        self.provider
            .test_connection()
            .await
            .with_context(|| format!("{} service is not reachable", self.provider.name()))
    }

    /// Translate one text; the original comes back on any failure
    pub async fn translate_one(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return text.to_string();
        }

        let source = self.source.code();
        let target = self.target.code();
        if let Some(cached) = self.cache.get(text, source, target) {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
            return cached;
        }

        self.single_calls.fetch_add(1, Ordering::Relaxed);
        let call = self.provider.translate(text, source, target);
        match tokio::time::timeout(self.timeout, call).await {
            Err(_) => {
                self.record(FailureKind::Timeout, format!("no answer within {:?} for '{}'", self.timeout, truncate_text(text, 40)));
                text.to_string()
            }
            Ok(Err(e)) => {
                self.record(FailureKind::ServiceFailure, format!("'{}': {}", truncate_text(text, 40), e));
                text.to_string()
            }
            Ok(Ok(Some(translated))) if !translated.trim().is_empty() => {
                self.cache.store(text, source, target, &translated);
                translated
            }
            Ok(Ok(_)) => {
                self.record(FailureKind::EmptyResult, format!("'{}'", truncate_text(text, 40)));
                text.to_string()
            }
        }
    }

    /// Translate texts in one batch call
    ///
    /// The answer is used only when it has exactly one string per input;
    /// otherwise every input comes back unchanged. A single empty element
    /// keeps its own original.
    pub async fn translate_batch(&self, texts: &[String]) -> Vec<String> {
        if texts.is_empty() {
            return Vec::new();
        }

        let source = self.source.code();
        let target = self.target.code();
        self.batch_calls.fetch_add(1, Ordering::Relaxed);
        let deadline = self.batch_deadline(texts.len());
        let call = self.provider.translate_batch(texts, source, target);

        let translated = match tokio::time::timeout(deadline, call).await {
            Err(_) => {
                self.record(FailureKind::Timeout, format!("batch of {} texts took longer than {:?}", texts.len(), deadline));
                return texts.to_vec();
            }
            Ok(Err(e)) => {
                self.record(FailureKind::ServiceFailure, format!("batch of {} texts: {}", texts.len(), e));
                return texts.to_vec();
            }
            Ok(Ok(None)) => {
                self.record(FailureKind::BatchShapeMismatch, format!("batch of {} texts got no result", texts.len()));
                return texts.to_vec();
            }
            Ok(Ok(Some(translated))) => translated,
        };

        if translated.len() != texts.len() {
            self.record(
                FailureKind::BatchShapeMismatch,
                format!("sent {} texts, received {}", texts.len(), translated.len()),
            );
            return texts.to_vec();
        }

        texts
            .iter()
            .zip(translated)
            .map(|(original, translated)| {
                if translated.trim().is_empty() && !original.trim().is_empty() {
                    self.record(FailureKind::EmptyResult, format!("batch element '{}'", truncate_text(original, 40)));
                    original.clone()
                } else {
                    self.cache.store(original, source, target, &translated);
                    translated
                }
            })
            .collect()
    }

    fn record(&self, kind: FailureKind, detail: String) {
        warn!("Translation fell back to original text ({}): {}", kind, detail);
        self.failures.lock().push(FailureRecord { kind, detail });
    }

    /// Every fallback recorded so far
    pub fn failures(&self) -> Vec<FailureRecord> {
        self.failures.lock().clone()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.lock().len()
    }

    /// Remove and return the recorded fallbacks
    pub fn take_failures(&self) -> Vec<FailureRecord> {
        std::mem::take(&mut *self.failures.lock())
    }

    pub fn stats(&self) -> GatewayStats {
        let stats = GatewayStats {
            single_calls: self.single_calls.load(Ordering::Relaxed),
            batch_calls: self.batch_calls.load(Ordering::Relaxed),
            failures: self.failure_count(),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
        };
        debug!("Gateway stats: {:?}", stats);
        stats
    }
}
