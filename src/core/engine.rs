//! Seams between the service and the machine-translation library

use async_trait::async_trait;
use std::sync::Arc;

use crate::core::config::GenerationSettings;
use crate::core::errors::Result;
use crate::core::models::ModelSpec;

/// One loaded tokenizer + generation model for a single translation direction
#[async_trait]
pub trait TranslationEngine: Send + Sync {
    /// Encode `text`, run generation and decode the best candidate
    async fn translate(&self, text: &str) -> Result<String>;

    /// Pretrained model identifier this engine was loaded from
    fn model_id(&self) -> &str;
}

/// Builds engines at startup
pub trait EngineLoader {
    /// Load the model for `spec`; an error aborts startup
    fn load(
        &self,
        spec: &ModelSpec,
        settings: &GenerationSettings,
    ) -> Result<Arc<dyn TranslationEngine>>;
}

impl<F> EngineLoader for F
where
    F: Fn(&ModelSpec, &GenerationSettings) -> Result<Arc<dyn TranslationEngine>>,
{
    fn load(
        &self,
        spec: &ModelSpec,
        settings: &GenerationSettings,
    ) -> Result<Arc<dyn TranslationEngine>> {
        self(spec, settings)
    }
}
