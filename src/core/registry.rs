//! Startup-built, read-only mapping from language pair to loaded model

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::core::config::AppConfig;
use crate::core::engine::{EngineLoader, TranslationEngine};
use crate::core::errors::{Result, TranslationError};
use crate::core::models::ModelSpec;

/// A language pair and the engine serving it
#[derive(Clone)]
pub struct ModelEntry {
    /// Configured pair and model identifier
    pub spec: ModelSpec,
    /// Loaded model
    pub engine: Arc<dyn TranslationEngine>,
}

impl ModelEntry {
    /// Pair a spec with its loaded engine
    pub fn new(spec: ModelSpec, engine: Arc<dyn TranslationEngine>) -> Self {
        Self { spec, engine }
    }
}

impl fmt::Debug for ModelEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelEntry")
            .field("spec", &self.spec)
            .field("engine", &self.engine.model_id())
            .finish()
    }
}

/// Immutable model registry.
///
/// Entries keep the order they were configured in, which is also the order the
/// form lists them. There is no way to add or remove an entry once built.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    entries: Vec<ModelEntry>,
}

impl ModelRegistry {
    /// Build from already-loaded entries
    pub fn new(entries: Vec<ModelEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(TranslationError::config("model registry cannot be empty"));
        }

        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.spec.key.as_str()) {
                return Err(TranslationError::DuplicateLanguagePair {
                    key: entry.spec.key.clone(),
                });
            }
        }

        Ok(Self { entries })
    }

    /// Load every configured language pair. The first failure aborts.
    pub fn load(config: &AppConfig, loader: &dyn EngineLoader) -> Result<Self> {
        config.validate()?;

        let mut entries = Vec::with_capacity(config.models.len());
        for spec in &config.models {
            let start = Instant::now();
            info!("Loading {}", spec);

            let engine = loader
                .load(spec, &config.generation)
                .map_err(|e| match e {
                    TranslationError::ModelLoad { .. } => e,
                    other => TranslationError::ModelLoad {
                        key: spec.key.clone(),
                        model_id: spec.model_id.clone(),
                        message: other.to_string(),
                    },
                })?;

            info!("Loaded {} in {:?}", spec.key, start.elapsed());
            entries.push(ModelEntry::new(spec.clone(), engine));
        }

        Self::new(entries)
    }

    /// Engine entry for a language pair
    pub fn get(&self, key: &str) -> Option<&ModelEntry> {
        self.entries.iter().find(|e| e.spec.key == key)
    }

    /// Whether a model is registered for `key`
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Language pair keys in configuration order
    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.spec.key.as_str()).collect()
    }

    /// All entries in configuration order
    pub fn entries(&self) -> &[ModelEntry] {
        &self.entries
    }

    /// Number of language pairs
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false for a registry built through `new` or `load`
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::GenerationSettings;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct EchoEngine(String);

    #[async_trait]
    impl TranslationEngine for EchoEngine {
        async fn translate(&self, text: &str) -> Result<String> {
            Ok(text.to_string())
        }

        fn model_id(&self) -> &str {
            &self.0
        }
    }

    fn echo_loader(
        spec: &ModelSpec,
        _settings: &GenerationSettings,
    ) -> Result<Arc<dyn TranslationEngine>> {
        Ok(Arc::new(EchoEngine(spec.model_id.clone())))
    }

    #[test]
    fn test_load_keeps_configured_order() {
        let config = AppConfig::default().with_default_models();
        let registry = ModelRegistry::load(&config, &echo_loader).unwrap();

        assert_eq!(registry.len(), 6);
        assert_eq!(
            registry.keys(),
            vec![
                "ENGLISH-URDU",
                "ENGLISH-HINDI",
                "ENGLISH-FRENCH",
                "ENGLISH-SPANISH",
                "ENGLISH-ARABIC",
                "ENGLISH-GERMAN",
            ]
        );
        assert_eq!(
            registry.get("ENGLISH-GERMAN").unwrap().engine.model_id(),
            "Helsinki-NLP/opus-mt-en-de"
        );
        assert!(!registry.contains("ENGLISH-KLINGON"));
    }

    #[test]
    fn test_load_failure_is_fatal() {
        let calls = AtomicUsize::new(0);
        let loader = |spec: &ModelSpec, _: &GenerationSettings| -> Result<Arc<dyn TranslationEngine>> {
            calls.fetch_add(1, Ordering::SeqCst);
            if spec.key == "ENGLISH-HINDI" {
                return Err(TranslationError::Generation {
                    message: "missing rust_model.ot".to_string(),
                });
            }
            Ok(Arc::new(EchoEngine(spec.model_id.clone())))
        };

        let config = AppConfig::default().with_default_models();
        let err = ModelRegistry::load(&config, &loader).unwrap_err();

        match err {
            TranslationError::ModelLoad { key, model_id, message } => {
                assert_eq!(key, "ENGLISH-HINDI");
                assert_eq!(model_id, "Helsinki-NLP/opus-mt-en-hi");
                assert!(message.contains("rust_model.ot"));
            }
            other => panic!("unexpected error: {}", other),
        }
        // URDU loaded, HINDI failed, nothing after it was attempted
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_duplicate_entries_rejected() {
        let spec = ModelSpec::new("ENGLISH-FRENCH", "Helsinki-NLP/opus-mt-en-ROMANCE")
            .with_target_language("fr");
        let engine: Arc<dyn TranslationEngine> = Arc::new(EchoEngine(spec.model_id.clone()));
        let entries = vec![
            ModelEntry::new(spec.clone(), engine.clone()),
            ModelEntry::new(spec, engine),
        ];

        assert!(matches!(
            ModelRegistry::new(entries),
            Err(TranslationError::DuplicateLanguagePair { .. })
        ));
    }

    #[test]
    fn test_empty_registry_rejected() {
        assert!(ModelRegistry::new(vec![]).is_err());
    }
}
