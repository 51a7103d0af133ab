/*!
 * # docxlate - Word document translation
 *
 * A Rust library for translating the text of Word (`.docx`) documents while
 * keeping their formatting intact.
 *
 * ## Features
 *
 * - Read and write `.docx` packages, leaving untouched parts byte-identical
 * - Translate body paragraphs and table cells through:
 *   - Google web translate
 *   - LibreTranslate
 * - Three replacement policies, from whole-paragraph rewrite to per-run
 *   replacement that keeps bold, italic, fonts and colours
 * - Sequential, region-batched and worker-pool dispatch
 * - Service failures fall back to the original text, never abort a document
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `document`: Document model and `.docx` package handling
 * - `translation`: The translation engine:
 *   - `translation::units`: Text unit extraction
 *   - `translation::gateway`: Failure-absorbing service access
 *   - `translation::replace`: Write-back under a replacement policy
 *   - `translation::orchestrator`: A full pass over a document
 * - `providers`: Clients for translation services
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `language_utils`: Supported languages and ISO code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod document;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod providers;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::Controller;
pub use document::{Document, DocxPackage};
pub use errors::{AppError, DocumentError, ProviderError, TranslationError};
pub use language_utils::{SourceLanguage, TargetLanguage, get_language_name, language_codes_match};
pub use translation::{
    ConcurrencyMode, DocumentTranslator, EngineOptions, ReplacementPolicy, TranslationGateway, TranslationReport,
};
