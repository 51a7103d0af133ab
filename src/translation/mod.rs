/*!
 * Document translation engine.
 *
 * This module turns a parsed document into a translated one. It is split
 * into several submodules:
 *
 * - `units`: Extraction of addressable text units
 * - `gateway`: Failure-absorbing access to the translation service
 * - `concurrency`: Dispatch modes and per-service tuning
 * - `orchestrator`: A full pass over a document
 * - `replace`: Writing translations back under a replacement policy
 * - `cache`: Caching of translated texts
 */

// Re-export main types for easier usage
pub use self::cache::TranslationCache;
pub use self::concurrency::{ConcurrencyMode, ProviderProfile};
pub use self::gateway::{FailureKind, FailureRecord, GatewayStats, TranslationGateway};
pub use self::orchestrator::{DocumentTranslator, EngineOptions, TranslationReport};
pub use self::replace::{ReplacementPolicy, apply, restore_edges};
pub use self::units::{CellPath, Granularity, Region, TextUnit, UnitId, extract};

// Submodules
pub mod cache;
pub mod concurrency;
pub mod gateway;
pub mod orchestrator;
pub mod replace;
pub mod units;
