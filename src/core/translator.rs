//! Routes text to the engine registered for a language pair

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::core::errors::{Result, TranslationError};
use crate::core::models::{TranslationOutcome, TranslationRequest};
use crate::core::registry::ModelRegistry;

/// Translator over a fixed model registry
#[derive(Debug, Clone)]
pub struct Translator {
    registry: Arc<ModelRegistry>,
}

impl Translator {
    /// Translator over a loaded registry
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self { registry }
    }

    /// Underlying registry
    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Language pair keys in display order
    pub fn languages(&self) -> Vec<&str> {
        self.registry.keys()
    }

    /// Whether `key` has a loaded model
    pub fn supports(&self, key: &str) -> bool {
        self.registry.contains(key)
    }

    /// Translate `text` with the model registered for `key`.
    ///
    /// Callers are expected to check the key first; an unknown key is
    /// reported as [`TranslationError::UnknownLanguagePair`].
    pub async fn translate(&self, text: &str, key: &str) -> Result<String> {
        let entry = self
            .registry
            .get(key)
            .ok_or_else(|| TranslationError::UnknownLanguagePair {
                key: key.to_string(),
            })?;

        let start = Instant::now();
        let translated = entry.engine.translate(text).await?;
        debug!(
            "Translated {} chars with {} in {:?}",
            text.chars().count(),
            entry.spec.model_id,
            start.elapsed()
        );

        Ok(translated)
    }

    /// Decide what the page shows for a submitted request
    pub async fn resolve(&self, request: &TranslationRequest) -> Result<TranslationOutcome> {
        if !self.supports(&request.dest_lang) {
            warn!("No model for language pair {:?}", request.dest_lang);
            return Ok(TranslationOutcome::Unavailable);
        }

        if request.is_blank() {
            return Ok(TranslationOutcome::Skipped);
        }

        self.translate(&request.text, &request.dest_lang)
            .await
            .map(TranslationOutcome::Translated)
    }
}
