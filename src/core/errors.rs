//! Custom error types for translation operations

use thiserror::Error;

/// Translation-related errors
#[derive(Error, Debug)]
pub enum TranslationError {
    /// No model is registered for the requested language pair
    #[error("Unknown language pair: {key}")]
    UnknownLanguagePair {
        /// Submitted language pair key
        key: String,
    },

    /// The same language pair was configured twice
    #[error("Duplicate language pair: {key}")]
    DuplicateLanguagePair {
        /// Repeated language pair key
        key: String,
    },

    /// A pretrained model could not be loaded at startup
    #[error("Failed to load model {model_id} for {key}: {message}")]
    ModelLoad {
        /// Language pair being loaded
        key: String,
        /// Pretrained model identifier
        model_id: String,
        /// Underlying failure
        message: String,
    },

    /// The underlying library failed during generation
    #[error("Generation error: {message}")]
    Generation {
        /// Library error text
        message: String,
    },

    /// Generation returned no candidates
    #[error("Model {model_id} returned no translation")]
    EmptyOutput {
        /// Model that produced nothing
        model_id: String,
    },

    /// The engine worker is gone
    #[error("Translation engine for {model_id} is not running")]
    EngineUnavailable {
        /// Model whose worker stopped
        model_id: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        /// What is wrong
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

impl TranslationError {
    /// Shorthand for configuration failures
    pub fn config(message: impl Into<String>) -> Self {
        TranslationError::ConfigError {
            message: message.into(),
        }
    }
}

#[cfg(feature = "marian")]
impl From<rust_bert::RustBertError> for TranslationError {
    fn from(err: rust_bert::RustBertError) -> Self {
        TranslationError::Generation {
            message: err.to_string(),
        }
    }
}

/// Result type for translation operations
pub type Result<T> = std::result::Result<T, TranslationError>;
