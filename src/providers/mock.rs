/*!
 * Mock translation service for testing.
 *
 * This module provides a mock service that simulates different behaviors:
 * - `MockProvider::working()` - Always succeeds, using a dictionary when one is set
 * - `MockProvider::intermittent(n)` - Fails every nth call
 * - `MockProvider::failing()` - Always fails with an error
 * - `MockProvider::empty()` - Answers without a translation
 * - `MockProvider::short_batch()` - Batch answers miss their last element
 * - `MockProvider::slow(ms)` - Succeeds after a delay
 */

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::ProviderError;
use crate::providers::Provider;

/// Behavior mode for the mock service
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Fails every Nth call (single and batch calls share the counter)
    Intermittent { fail_every: usize },
    /// Always fails with an error
    Failing,
    /// Returns `None` for every call
    Empty,
    /// Singles succeed; batches come back one element short
    ShortBatch,
    /// Succeeds after a delay (for timeout testing)
    Slow { delay_ms: u64 },
}

/// Call counters shared between clones
#[derive(Debug, Default)]
struct Counters {
    single_calls: AtomicUsize,
    batch_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// Mock service with deterministic output
///
/// Known texts are translated through the dictionary; anything else comes
/// back as `[<target>] <text>`.
#[derive(Debug, Clone)]
pub struct MockProvider {
    behavior: MockBehavior,
    dictionary: Arc<HashMap<String, String>>,
    counters: Arc<Counters>,
}

/// Decrements the in-flight counter when a call ends
struct InFlight<'a>(&'a Counters);

impl<'a> InFlight<'a> {
    fn enter(counters: &'a Counters) -> Self {
        let now = counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        counters.max_in_flight.fetch_max(now, Ordering::SeqCst);
        Self(counters)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockProvider {
    /// Create a new mock service with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            dictionary: Arc::new(HashMap::new()),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Create a working mock service that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create an intermittently failing mock service
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent {
            fail_every: fail_every.max(1),
        })
    }

    /// Create a failing mock service that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that answers without a translation
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Create a mock whose batch answers are one element short
    pub fn short_batch() -> Self {
        Self::new(MockBehavior::ShortBatch)
    }

    /// Create a mock that answers after `delay_ms` milliseconds
    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Set fixed translations for known texts
    pub fn with_dictionary<I, K, V>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.dictionary = Arc::new(entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    /// Number of single-text calls received
    pub fn single_calls(&self) -> usize {
        self.counters.single_calls.load(Ordering::SeqCst)
    }

    /// Number of batch calls received
    pub fn batch_calls(&self) -> usize {
        self.counters.batch_calls.load(Ordering::SeqCst)
    }

    /// Highest number of calls that were in progress at the same time
    pub fn max_in_flight(&self) -> usize {
        self.counters.max_in_flight.load(Ordering::SeqCst)
    }

    fn render(&self, text: &str, target_language: &str) -> String {
        self.dictionary
            .get(text)
            .cloned()
            .unwrap_or_else(|| format!("[{}] {}", target_language, text))
    }

    /// Shared failure and delay handling; `call` is the 0-based call number
    async fn gate(&self, call: usize) -> Result<bool, ProviderError> {
        match self.behavior {
            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated service failure".to_string(),
                status_code: 500,
            }),
            MockBehavior::Intermittent { fail_every } if call % fail_every == fail_every - 1 => {
                Err(ProviderError::ApiError {
                    message: format!("Simulated intermittent failure (call #{})", call + 1),
                    status_code: 503,
                })
            }
            MockBehavior::Empty => Ok(false),
            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                Ok(true)
            }
            _ => Ok(true),
        }
    }

    fn total_calls(&self) -> usize {
        self.single_calls() + self.batch_calls()
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn translate(
        &self,
        text: &str,
        _source_language: &str,
        target_language: &str,
    ) -> Result<Option<String>, ProviderError> {
        let call = self.total_calls();
        self.counters.single_calls.fetch_add(1, Ordering::SeqCst);
        let _guard = InFlight::enter(&self.counters);

        if !self.gate(call).await? {
            return Ok(None);
        }
        Ok(Some(self.render(text, target_language)))
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        _source_language: &str,
        target_language: &str,
    ) -> Result<Option<Vec<String>>, ProviderError> {
        let call = self.total_calls();
        self.counters.batch_calls.fetch_add(1, Ordering::SeqCst);
        let _guard = InFlight::enter(&self.counters);

        if !self.gate(call).await? {
            return Ok(None);
        }
        let mut results: Vec<String> = texts.iter().map(|t| self.render(t, target_language)).collect();
        if self.behavior == MockBehavior::ShortBatch {
            results.pop();
        }
        Ok(Some(results))
    }

    fn batch_round_trips(&self, _batch_len: usize) -> usize {
        1
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        match self.behavior {
            MockBehavior::Failing => Err(ProviderError::ConnectionError("Simulated outage".to_string())),
            _ => Ok(()),
        }
    }
}
