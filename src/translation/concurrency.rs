/*!
 * Dispatch modes and service-specific concurrency tuning.
 *
 * The mode decides how units reach the gateway; the profile supplies the
 * default worker pool size and pacing for each service.
 */

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::app_config::TranslationProvider;

/// How extracted units are sent to the translation service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcurrencyMode {
    /// One single call per unit, in extraction order
    #[default]
    Sequential,
    /// One batch call per region, regions in parallel
    RegionBatched,
    /// One single call per unit on a bounded pool of tasks
    WorkerPool,
}

impl ConcurrencyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::RegionBatched => "region_batched",
            Self::WorkerPool => "worker_pool",
        }
    }
}

impl fmt::Display for ConcurrencyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Service-specific concurrency profile with tuned defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    /// Maximum concurrent requests
    pub max_concurrent_requests: usize,
    /// Target requests per minute (for rate limiting)
    pub target_rpm: Option<u32>,
    /// Whether the service has a native batch call
    pub native_batch: bool,
}

impl ProviderProfile {
    /// Get the profile for a given service
    pub fn for_provider(provider: TranslationProvider) -> Self {
        match provider {
            TranslationProvider::Google => Self {
                // The public endpoint blocks clients that fan out too far
                max_concurrent_requests: 4,
                target_rpm: None,
                native_batch: false,
            },
            TranslationProvider::LibreTranslate => Self {
                max_concurrent_requests: 2,
                target_rpm: Some(30),
                native_batch: true,
            },
        }
    }

    /// Profile for in-process services without limits
    pub fn unlimited() -> Self {
        Self {
            max_concurrent_requests: 8,
            target_rpm: None,
            native_batch: true,
        }
    }

    /// Get effective concurrent requests, respecting any user override
    pub fn effective_concurrent_requests(&self, user_override: Option<usize>) -> usize {
        user_override.unwrap_or(self.max_concurrent_requests).max(1)
    }
}
