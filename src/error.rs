//! Error types for the shopping assistant engine
//!
//! None of these ever terminate a session. Collaborator failures are logged
//! by the component that made the call and degraded to an empty result.

use thiserror::Error;

/// Result type alias for assistant operations
pub type Result<T> = std::result::Result<T, AssistantError>;

#[derive(Error, Debug)]
pub enum AssistantError {

    // =============================
    // Collaborator Failures
    // =============================

    #[error("Classification failure: {0}")]
    ClassificationFailure(String),

    #[error("External lookup failure: {0}")]
    ExternalLookupFailure(String),

    #[error("Summarizer failure: {0}")]
    SummarizerFailure(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Dataset unavailable: {0}")]
    DatasetUnavailable(String),

    // =============================
    // Startup Errors
    // =============================

    #[error("Configuration error: {0}")]
    Config(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Pattern error: {0}")]
    PatternError(#[from] regex::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
