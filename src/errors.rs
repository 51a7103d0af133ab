/*!
 * Error types for the docxlate application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when talking to a translation service
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The service refuses texts above a fixed length
    #[error("Text is {length} characters long, the service accepts at most {limit}")]
    TextTooLong {
        /// Length of the rejected text in characters
        length: usize,
        /// Maximum accepted length
        limit: usize,
    },
}

/// Errors that can occur while reading or writing a Word package
#[derive(Error, Debug)]
pub enum DocumentError {
    /// I/O failure while reading package bytes or files
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The ZIP container could not be read or written
    #[error("Package container error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The document XML could not be parsed or written
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// A required part is absent from the package
    #[error("Missing package part: {0}")]
    MissingPart(String),

    /// The document XML does not have the expected structure
    #[error("Malformed document: {0}")]
    Malformed(String),

    /// A part is not valid UTF-8
    #[error("Invalid encoding in {part}: {message}")]
    Encoding {
        /// Part name
        part: String,
        /// Decoder message
        message: String,
    },
}

/// Errors that abort a translation pass
///
/// Service failures never show up here during a pass; the gateway absorbs
/// them and keeps the original text.
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from the document layer
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// A unit's recorded location no longer matches the document
    #[error("Structural integrity violation at {unit}: {reason}")]
    StructuralIntegrity {
        /// Display form of the unit path
        unit: String,
        /// What did not match
        reason: String,
    },

    /// A unit was handed to a replacement policy of the wrong granularity
    #[error("Unit {unit} cannot be written with the {policy} policy")]
    PolicyMismatch {
        /// Display form of the unit path
        unit: String,
        /// Policy name
        policy: String,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from the document layer
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
