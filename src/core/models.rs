//! Core data models for translation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Message shown when the submitted language pair has no loaded model
pub const MODEL_UNAVAILABLE_MESSAGE: &str = "Selected language model is not available.";

/// A configured translation direction and the pretrained model serving it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Language pair key, e.g. `ENGLISH-FRENCH`
    pub key: String,
    /// Pretrained model identifier, e.g. `Helsinki-NLP/opus-mt-en-de`
    pub model_id: String,
    /// ISO 639-1 code of the output language for multi-target models such as
    /// `opus-mt-en-ROMANCE`. Single-direction models leave it unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_language: Option<String>,
    /// Directory holding converted weights (`rust_model.ot`, `config.json`,
    /// `vocab.json`, `source.spm`). When unset the files come from the hub.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
}

impl ModelSpec {
    /// Single-direction model fetched from the hub
    pub fn new(key: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            model_id: model_id.into(),
            target_language: None,
            local_path: None,
        }
    }

    /// Select the output language of a multi-target model
    pub fn with_target_language(mut self, code: impl Into<String>) -> Self {
        self.target_language = Some(code.into());
        self
    }

    /// Read converted weights from `dir` instead of the hub
    pub fn with_local_path(mut self, dir: impl AsRef<Path>) -> Self {
        self.local_path = Some(dir.as_ref().to_path_buf());
        self
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target_language {
            Some(code) => write!(f, "{} ({}, >>{}<<)", self.key, self.model_id, code),
            None => write!(f, "{} ({})", self.key, self.model_id),
        }
    }
}

/// Translation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationRequest {
    /// Text as submitted, untrimmed
    pub text: String,
    /// Language pair key chosen in the form
    pub dest_lang: String,
}

impl TranslationRequest {
    /// Build a request from form or API fields
    pub fn new(text: impl Into<String>, dest_lang: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            dest_lang: dest_lang.into(),
        }
    }

    /// Whether there is anything worth sending to a model
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// What the web layer shows for a submitted request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationOutcome {
    /// Decoded output of the model
    Translated(String),
    /// Blank input, the model was not called
    Skipped,
    /// The language pair is not in the registry
    Unavailable,
}

impl TranslationOutcome {
    /// Text for the result field of the page
    pub fn display_text(&self) -> &str {
        match self {
            TranslationOutcome::Translated(text) => text,
            TranslationOutcome::Skipped => "",
            TranslationOutcome::Unavailable => MODEL_UNAVAILABLE_MESSAGE,
        }
    }

    /// Owned result text
    pub fn into_text(self) -> String {
        match self {
            TranslationOutcome::Translated(text) => text,
            other => other.display_text().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_requests() {
        assert!(TranslationRequest::new("", "ENGLISH-FRENCH").is_blank());
        assert!(TranslationRequest::new(" \n\t ", "ENGLISH-FRENCH").is_blank());
        assert!(!TranslationRequest::new("Hello", "ENGLISH-FRENCH").is_blank());
    }

    #[test]
    fn test_spec_builders_and_display() {
        let spec = ModelSpec::new("ENGLISH-SPANISH", "Helsinki-NLP/opus-mt-en-ROMANCE")
            .with_target_language("es");
        assert_eq!(spec.target_language.as_deref(), Some("es"));
        assert_eq!(
            spec.to_string(),
            "ENGLISH-SPANISH (Helsinki-NLP/opus-mt-en-ROMANCE, >>es<<)"
        );

        let local = ModelSpec::new("ENGLISH-URDU", "Helsinki-NLP/opus-mt-en-ur")
            .with_local_path("models/opus-mt-en-ur");
        assert_eq!(local.local_path, Some(PathBuf::from("models/opus-mt-en-ur")));
        assert_eq!(local.to_string(), "ENGLISH-URDU (Helsinki-NLP/opus-mt-en-ur)");
    }

    #[test]
    fn test_spec_optional_fields_default_in_json() {
        let spec: ModelSpec =
            serde_json::from_str(r#"{"key": "ENGLISH-GERMAN", "model_id": "Helsinki-NLP/opus-mt-en-de"}"#)
                .unwrap();
        assert_eq!(spec, ModelSpec::new("ENGLISH-GERMAN", "Helsinki-NLP/opus-mt-en-de"));
        assert_eq!(
            serde_json::to_value(&spec).unwrap(),
            serde_json::json!({"key": "ENGLISH-GERMAN", "model_id": "Helsinki-NLP/opus-mt-en-de"})
        );
    }

    #[test]
    fn test_outcome_display_text() {
        assert_eq!(
            TranslationOutcome::Translated("Bonjour".to_string()).display_text(),
            "Bonjour"
        );
        assert_eq!(TranslationOutcome::Skipped.display_text(), "");
        assert_eq!(
            TranslationOutcome::Unavailable.into_text(),
            "Selected language model is not available."
        );
    }
}
