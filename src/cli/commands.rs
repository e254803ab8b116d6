//! CLI command definitions and handlers

use clap::Subcommand;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::core::config::AppConfig;
use crate::core::engine::EngineLoader;
use crate::core::models::{TranslationOutcome, TranslationRequest, MODEL_UNAVAILABLE_MESSAGE};
use crate::core::registry::ModelRegistry;
use crate::core::translator::Translator;

/// Commands for the language translator
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the web form server
    Serve {
        /// Bind address (default: 0.0.0.0)
        #[arg(long)]
        host: Option<String>,

        /// Listen port (default: 5000)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List configured language pairs
    Languages,

    /// Translate a single text and exit
    Translate {
        /// Language pair key, e.g. ENGLISH-FRENCH
        #[arg(short, long)]
        lang: String,

        /// Text to translate
        text: String,
    },
}

/// Load configuration from a file or the environment
pub fn resolve_config(path: Option<&PathBuf>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            AppConfig::from_file(path)?
        }
        None => AppConfig::load()?,
    };
    config.validate()?;
    Ok(config)
}

/// Handle serve command
pub async fn handle_serve(
    mut config: AppConfig,
    host: Option<String>,
    port: Option<u16>,
    loader: &dyn EngineLoader,
) -> anyhow::Result<()> {
    use crate::server::api::run_server;

    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }

    let start_time = Instant::now();
    let registry = Arc::new(ModelRegistry::load(&config, loader)?);
    info!(
        "Loaded {} models in {:?}",
        registry.len(),
        start_time.elapsed()
    );

    println!("🚀 Server starting on http://{}", config.bind_address());

    run_server(&config, registry).await?;

    Ok(())
}

/// Handle languages command
pub fn handle_languages(config: &AppConfig) -> anyhow::Result<()> {
    for spec in &config.models {
        match &spec.local_path {
            Some(dir) => println!("{:<20} {} [{}]", spec.key, spec.model_id, dir.display()),
            None => println!("{:<20} {}", spec.key, spec.model_id),
        }
    }
    Ok(())
}

/// Handle translate command. Only the requested pair is loaded.
pub async fn handle_translate(
    config: &AppConfig,
    lang: String,
    text: String,
    loader: &dyn EngineLoader,
) -> anyhow::Result<()> {
    let spec = config
        .find_model(&lang)
        .ok_or_else(|| anyhow::anyhow!(MODEL_UNAVAILABLE_MESSAGE))?;

    let single = AppConfig {
        models: vec![spec.clone()],
        ..config.clone()
    };
    let registry = Arc::new(ModelRegistry::load(&single, loader)?);
    let translator = Translator::new(registry);

    match translator.resolve(&TranslationRequest::new(text, lang)).await? {
        TranslationOutcome::Translated(text) => println!("{}", text),
        TranslationOutcome::Skipped => anyhow::bail!("Nothing to translate"),
        TranslationOutcome::Unavailable => anyhow::bail!(MODEL_UNAVAILABLE_MESSAGE),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::GenerationSettings;
    use crate::core::engine::TranslationEngine;
    use crate::core::errors::Result;
    use crate::core::models::ModelSpec;
    use std::sync::Mutex;

    #[test]
    fn test_resolve_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pairs.yml");
        std::fs::write(
            &path,
            "models:\n  - key: ENGLISH-FRENCH\n    model_id: Helsinki-NLP/opus-mt-en-ROMANCE\n    target_language: fr\n",
        )
        .unwrap();

        let config = resolve_config(Some(&path)).unwrap();
        assert_eq!(config.models.len(), 1);
        assert_eq!(config.models[0].target_language.as_deref(), Some("fr"));
    }

    #[test]
    fn test_resolve_config_rejects_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pairs.json");
        std::fs::write(
            &path,
            r#"{"models": [
                {"key": "ENGLISH-FRENCH", "model_id": "a"},
                {"key": "ENGLISH-FRENCH", "model_id": "b"}
            ]}"#,
        )
        .unwrap();

        assert!(resolve_config(Some(&path)).is_err());
    }

    #[tokio::test]
    async fn test_translate_loads_only_requested_pair() {
        let loaded = Mutex::new(Vec::new());
        let loader = |spec: &ModelSpec, _: &GenerationSettings| -> Result<Arc<dyn TranslationEngine>> {
            loaded.lock().unwrap().push(spec.key.clone());
            Err(crate::core::errors::TranslationError::Generation {
                message: "no weights in tests".to_string(),
            })
        };

        let config = AppConfig::default().with_default_models();
        let result = handle_translate(
            &config,
            "ENGLISH-GERMAN".to_string(),
            "Hello".to_string(),
            &loader,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(*loaded.lock().unwrap(), vec!["ENGLISH-GERMAN".to_string()]);
    }

    #[tokio::test]
    async fn test_translate_unknown_pair() {
        let loader = |_: &ModelSpec, _: &GenerationSettings| -> Result<Arc<dyn TranslationEngine>> {
            panic!("no model should be loaded for an unknown pair")
        };

        let config = AppConfig::default().with_default_models();
        let err = handle_translate(
            &config,
            "ENGLISH-KLINGON".to_string(),
            "Hello".to_string(),
            &loader,
        )
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), MODEL_UNAVAILABLE_MESSAGE);
    }
}
