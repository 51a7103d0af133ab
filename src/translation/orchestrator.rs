/*!
 * Concurrency orchestrator.
 *
 * Runs one translation pass over a document: extract units, dispatch them
 * to the gateway in the configured mode, then write every result back on
 * the calling task once all translations are in. Results travel with the
 * identity captured at extraction, never matched by content.
 */

use log::{debug, error, info};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::concurrency::{ConcurrencyMode, ProviderProfile};
use super::gateway::{FailureRecord, TranslationGateway};
use super::replace::{self, ReplacementPolicy};
use super::units::{self, Region, TextUnit, UnitId};
use crate::app_config::Config;
use crate::document::Document;
use crate::errors::TranslationError;

/// Engine settings for a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub policy: ReplacementPolicy,
    pub mode: ConcurrencyMode,
    /// Upper bound on in-flight service calls in worker pool mode
    pub pool_size: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            policy: ReplacementPolicy::default(),
            mode: ConcurrencyMode::default(),
            pool_size: ProviderProfile::unlimited().max_concurrent_requests,
        }
    }
}

impl EngineOptions {
    pub fn new(policy: ReplacementPolicy, mode: ConcurrencyMode) -> Self {
        Self {
            policy,
            mode,
            ..Self::default()
        }
    }

    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size.max(1);
        self
    }

    /// Options from the engine section, pool size falling back to the
    /// service's configured concurrency and then to its profile
    pub fn from_config(config: &Config) -> Self {
        let profile = ProviderProfile::for_provider(config.translation.provider);
        let pool_size = profile.effective_concurrent_requests(
            config
                .engine
                .pool_size
                .or_else(|| config.translation.optimal_concurrent_requests()),
        );
        Self {
            policy: config.engine.policy,
            mode: config.engine.mode,
            pool_size,
        }
    }
}

/// Outcome of a translation pass
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationReport {
    /// Units extracted
    pub units: usize,
    /// Units whose text changed
    pub translated: usize,
    /// Units left with their source text
    pub unchanged: usize,
    /// Fallbacks recorded by the gateway during the pass
    pub failures: Vec<FailureRecord>,
    pub policy: ReplacementPolicy,
    pub mode: ConcurrencyMode,
    pub elapsed: Duration,
}

impl TranslationReport {
    /// Whether every service call of the pass succeeded
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Translates documents through a shared gateway
#[derive(Debug, Clone)]
pub struct DocumentTranslator {
    gateway: Arc<TranslationGateway>,
    options: EngineOptions,
}

impl DocumentTranslator {
    pub fn new(gateway: TranslationGateway, options: EngineOptions) -> Self {
        Self::with_shared_gateway(Arc::new(gateway), options)
    }

    pub fn with_shared_gateway(gateway: Arc<TranslationGateway>, options: EngineOptions) -> Self {
        Self { gateway, options }
    }

    pub fn gateway(&self) -> &TranslationGateway {
        &self.gateway
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Translate a document in place
    pub async fn translate(&self, document: &mut Document) -> Result<TranslationReport, TranslationError> {
        self.translate_with_progress(document, |_, _| {}).await
    }

    /// Translate a document in place, reporting `(done, total)` units
    pub async fn translate_with_progress<F>(
        &self,
        document: &mut Document,
        progress: F,
    ) -> Result<TranslationReport, TranslationError>
    where
        F: Fn(usize, usize) + Sync,
    {
        let start = Instant::now();
        let shape_before = document.shape();
        let failures_before = self.gateway.failure_count();
        let policy = self.options.policy;
        let mode = self.options.mode;

        let units = units::extract(document, policy.granularity());
        info!(
            "Translating {} units to {} ({} policy, {} mode)",
            units.len(),
            self.gateway.target_language().display_name(),
            policy,
            mode
        );
        progress(0, units.len());

        let mut results = match mode {
            ConcurrencyMode::Sequential => self.run_sequential(&units, &progress).await,
            ConcurrencyMode::RegionBatched => self.run_region_batched(&units, &progress).await,
            ConcurrencyMode::WorkerPool => self.run_worker_pool(&units, &progress).await,
        };

        let mut translated = 0;
        for unit in &units {
            // A unit that fell back keeps its runs exactly as they are
            let Some(text) = results.remove(&unit.id).filter(|t| t.trim() != unit.text.trim()) else {
                continue;
            };
            replace::apply(document, unit, &text, policy)?;
            translated += 1;
        }

        let shape_after = document.shape();
        if shape_after != shape_before {
            return Err(TranslationError::StructuralIntegrity {
                unit: "document".to_string(),
                reason: format!("shape changed from {:?} to {:?}", shape_before, shape_after),
            });
        }

        let failures = self.gateway.failures().into_iter().skip(failures_before).collect();
        let report = TranslationReport {
            units: units.len(),
            translated,
            unchanged: units.len() - translated,
            failures,
            policy,
            mode,
            elapsed: start.elapsed(),
        };
        debug!("Pass finished: {:?}", report);
        Ok(report)
    }

    async fn run_sequential<F>(&self, units: &[TextUnit], progress: &F) -> HashMap<UnitId, String>
    where
        F: Fn(usize, usize) + Sync,
    {
        let mut results = HashMap::with_capacity(units.len());
        for (done, unit) in units.iter().enumerate() {
            let translated = self.gateway.translate_one(&unit.text).await;
            results.insert(unit.id, translated);
            progress(done + 1, units.len());
        }
        results
    }

    /// One batch per region, both regions in flight together
    async fn run_region_batched<F>(&self, units: &[TextUnit], progress: &F) -> HashMap<UnitId, String>
    where
        F: Fn(usize, usize) + Sync,
    {
        let (body, table): (Vec<&TextUnit>, Vec<&TextUnit>) =
            units.iter().partition(|unit| unit.region() == Region::Body);
        let body_texts: Vec<String> = body.iter().map(|u| u.text.clone()).collect();
        let table_texts: Vec<String> = table.iter().map(|u| u.text.clone()).collect();

        debug!("Region batches: {} body units, {} table units", body.len(), table.len());
        let (body_translated, table_translated) = tokio::join!(
            self.gateway.translate_batch(&body_texts),
            self.gateway.translate_batch(&table_texts)
        );
        progress(units.len(), units.len());

        body.iter()
            .zip(body_translated)
            .chain(table.iter().zip(table_translated))
            .map(|(unit, text)| (unit.id, text))
            .collect()
    }

    /// One task per unit, bounded by a semaphore of `pool_size` permits
    async fn run_worker_pool<F>(&self, units: &[TextUnit], progress: &F) -> HashMap<UnitId, String>
    where
        F: Fn(usize, usize) + Sync,
    {
        let semaphore = Arc::new(Semaphore::new(self.options.pool_size.max(1)));
        let mut tasks = JoinSet::new();

        for unit in units {
            let gateway = Arc::clone(&self.gateway);
            let semaphore = Arc::clone(&semaphore);
            let id = unit.id;
            let text = unit.text.clone();
            tasks.spawn(async move {
                let _permit = semaphore.acquire().await.ok();
                let translated = gateway.translate_one(&text).await;
                (id, translated)
            });
        }

        let mut results = HashMap::with_capacity(units.len());
        let mut done = 0;
        while let Some(joined) = tasks.join_next().await {
            done += 1;
            match joined {
                Ok((id, translated)) => {
                    results.insert(id, translated);
                }
                // The unit keeps its source text
                Err(e) => error!("Translation task failed: {}", e),
            }
            progress(done, units.len());
        }
        results
    }
}
