//! Marian engine backed by `rust-bert`.
//!
//! `TranslationModel` is not `Sync`, so each model is owned by its own worker
//! thread. Requests are queued on a channel and answered through a oneshot.

use async_trait::async_trait;
use rust_bert::marian::{MarianSourceLanguages, MarianTargetLanguages};
use rust_bert::pipelines::common::ModelType;
use rust_bert::pipelines::translation::{Language, TranslationConfig, TranslationModel};
use rust_bert::resources::{LocalResource, RemoteResource, ResourceProvider};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use tch::Device;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use crate::core::config::{DevicePreference, GenerationSettings};
use crate::core::engine::TranslationEngine;
use crate::core::errors::{Result, TranslationError};
use crate::core::models::ModelSpec;

/// Pending requests per model before senders wait
const QUEUE_DEPTH: usize = 32;

const HUB_URL: &str = "https://huggingface.co";

/// Text to translate and where to send the answer
type Job = (String, oneshot::Sender<Result<String>>);

/// Handle to a Marian model running on a dedicated thread
#[derive(Debug, Clone)]
pub struct MarianEngine {
    model_id: String,
    sender: mpsc::Sender<Job>,
}

impl MarianEngine {
    /// Download (or reuse the cached) weights and start the worker.
    ///
    /// Blocks until the model is loaded so a bad identifier fails startup.
    pub fn spawn(spec: &ModelSpec, settings: &GenerationSettings) -> Result<Self> {
        let target = target_language(spec).map_err(|e| load_error(spec, e))?;
        if let Some(dir) = &spec.local_path {
            ensure_converted(dir).map_err(|e| load_error(spec, e))?;
        }
        let config = translation_config(spec, target, settings);

        let (sender, receiver) = mpsc::channel::<Job>(QUEUE_DEPTH);
        let (ready_tx, ready_rx) = std::sync::mpsc::sync_channel::<Result<()>>(1);

        let model_id = spec.model_id.clone();
        thread::Builder::new()
            .name(format!("marian-{}", spec.key.to_lowercase()))
            .spawn(move || Self::runner(model_id, config, target, receiver, ready_tx))?;

        let loaded = ready_rx
            .recv()
            .map_err(|_| load_error(spec, "worker exited before reporting"))?;
        loaded.map_err(|e| load_error(spec, e))?;

        Ok(Self {
            model_id: spec.model_id.clone(),
            sender,
        })
    }

    /// Loader usable with `ModelRegistry::load`
    pub fn loader(
        spec: &ModelSpec,
        settings: &GenerationSettings,
    ) -> Result<Arc<dyn TranslationEngine>> {
        Ok(Arc::new(Self::spawn(spec, settings)?))
    }

    /// Owns the model for the lifetime of the process
    fn runner(
        model_id: String,
        config: TranslationConfig,
        target: Option<Language>,
        mut receiver: mpsc::Receiver<Job>,
        ready: std::sync::mpsc::SyncSender<Result<()>>,
    ) {
        // Needs to be in sync runtime, async doesn't work
        let model = match TranslationModel::new(config) {
            Ok(model) => {
                let _ = ready.send(Ok(()));
                model
            }
            Err(e) => {
                let _ = ready.send(Err(e.into()));
                return;
            }
        };

        while let Some((text, reply)) = receiver.blocking_recv() {
            let result = model
                .translate(&[text.as_str()], None, target)
                .map_err(TranslationError::from)
                .and_then(|mut outputs| {
                    if outputs.is_empty() {
                        Err(TranslationError::EmptyOutput {
                            model_id: model_id.clone(),
                        })
                    } else {
                        Ok(outputs.swap_remove(0))
                    }
                });

            if let Err(e) = &result {
                error!("{} generation failed: {}", model_id, e);
            }
            if reply.send(result).is_err() {
                debug!("Caller for {} went away before the result", model_id);
            }
        }

        info!("Worker for {} stopped", model_id);
    }
}

#[async_trait]
impl TranslationEngine for MarianEngine {
    async fn translate(&self, text: &str) -> Result<String> {
        let (reply, answer) = oneshot::channel();
        let unavailable = || TranslationError::EngineUnavailable {
            model_id: self.model_id.clone(),
        };

        self.sender
            .send((text.to_string(), reply))
            .await
            .map_err(|_| unavailable())?;
        answer.await.map_err(|_| unavailable())?
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

const WEIGHTS_FILE: &str = "rust_model.ot";
const CONFIG_FILE: &str = "config.json";
const VOCAB_FILE: &str = "vocab.json";
const SPM_FILE: &str = "source.spm";

/// The four files of a converted Marian checkpoint
struct ModelFiles<R> {
    model: R,
    config: R,
    vocab: R,
    spm: R,
}

impl ModelFiles<RemoteResource> {
    /// Files published on the hub under `model_id`
    fn hub(model_id: &str) -> Self {
        let cache_dir = model_id.replace('/', "-").to_lowercase();
        let resource = |kind: &str, file: &str| {
            let cache_subdir = format!("{}/{}", cache_dir, kind);
            let url = format!("{}/{}/resolve/main/{}", HUB_URL, model_id, file);
            RemoteResource::from_pretrained((cache_subdir.as_str(), url.as_str()))
        };

        Self {
            model: resource("model", WEIGHTS_FILE),
            config: resource("config", CONFIG_FILE),
            vocab: resource("vocab", VOCAB_FILE),
            spm: resource("spiece", SPM_FILE),
        }
    }
}

impl ModelFiles<LocalResource> {
    /// Files in a directory written by rust-bert's `convert_model.py`
    fn local(dir: &Path) -> Self {
        let resource = |file: &str| LocalResource {
            local_path: dir.join(file),
        };

        Self {
            model: resource(WEIGHTS_FILE),
            config: resource(CONFIG_FILE),
            vocab: resource(VOCAB_FILE),
            spm: resource(SPM_FILE),
        }
    }
}

/// Fail fast when a local checkpoint has not been converted yet
fn ensure_converted(dir: &Path) -> std::result::Result<(), String> {
    let missing: Vec<PathBuf> = [WEIGHTS_FILE, CONFIG_FILE, VOCAB_FILE, SPM_FILE]
        .iter()
        .map(|file| dir.join(file))
        .filter(|path| !path.is_file())
        .collect();

    if missing.is_empty() {
        return Ok(());
    }
    let names: Vec<String> = missing.iter().map(|p| p.display().to_string()).collect();
    Err(format!(
        "missing {}; convert the PyTorch checkpoint with rust-bert's utils/convert_model.py",
        names.join(", ")
    ))
}

/// Output language for a multi-target model, `None` for single-direction ones
fn target_language(spec: &ModelSpec) -> Result<Option<Language>> {
    let code = match spec.target_language.as_deref() {
        Some(code) => code.trim(),
        None => return Ok(None),
    };

    MarianTargetLanguages::ENGLISH2ROMANCE
        .iter()
        .find(|language| language.get_iso_639_1_code() == code)
        .copied()
        .map(Some)
        .ok_or_else(|| {
            TranslationError::config(format!(
                "{} has no multi-target Marian model for language code {:?}",
                spec.key, code
            ))
        })
}

fn load_error(spec: &ModelSpec, message: impl Display) -> TranslationError {
    TranslationError::ModelLoad {
        key: spec.key.clone(),
        model_id: spec.model_id.clone(),
        message: message.to_string(),
    }
}

fn device_for(preference: DevicePreference) -> Device {
    match preference {
        DevicePreference::Cpu => Device::Cpu,
        DevicePreference::Cuda => Device::Cuda(0),
        DevicePreference::Auto => Device::cuda_if_available(),
    }
}

/// Beam-search configuration for one language pair.
///
/// A target language switches to the English-to-ROMANCE language sets, so
/// rust-bert prepends the `>>xx<<` prefix the multi-target model expects.
fn translation_config(
    spec: &ModelSpec,
    target: Option<Language>,
    settings: &GenerationSettings,
) -> TranslationConfig {
    let romance_sources = MarianSourceLanguages::ENGLISH2ROMANCE;
    let romance_targets = MarianTargetLanguages::ENGLISH2ROMANCE;
    let no_languages: [Language; 0] = [];
    let (sources, targets): (&[Language], &[Language]) = match target {
        Some(_) => (&romance_sources[..], &romance_targets[..]),
        None => (&no_languages[..], &no_languages[..]),
    };

    let mut config = match &spec.local_path {
        Some(dir) => assemble(ModelFiles::local(dir), sources, targets, settings),
        None => assemble(ModelFiles::hub(&spec.model_id), sources, targets, settings),
    };
    config.num_beams = settings.num_beams;
    config.max_length = Some(settings.max_length);
    config.early_stopping = settings.early_stopping;
    config.do_sample = false;
    config.num_return_sequences = 1;
    config
}

fn assemble<R>(
    files: ModelFiles<R>,
    sources: &[Language],
    targets: &[Language],
    settings: &GenerationSettings,
) -> TranslationConfig
where
    R: ResourceProvider + Send + 'static,
{
    TranslationConfig::new(
        ModelType::Marian,
        files.model,
        files.config,
        files.vocab,
        Some(files.spm),
        sources,
        targets,
        device_for(settings.device),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn romance(key: &str, code: &str) -> ModelSpec {
        ModelSpec::new(key, "Helsinki-NLP/opus-mt-en-ROMANCE").with_target_language(code)
    }

    #[test]
    fn test_translation_config_defaults() {
        let config = translation_config(
            &ModelSpec::new("ENGLISH-GERMAN", "Helsinki-NLP/opus-mt-en-de"),
            None,
            &GenerationSettings::default(),
        );

        assert_eq!(config.num_beams, 4);
        assert_eq!(config.max_length, Some(512));
        assert!(config.early_stopping);
        assert!(config.source_languages.is_empty());
        assert!(config.target_languages.is_empty());
    }

    #[test]
    fn test_max_length_caps_generation() {
        let settings = GenerationSettings {
            max_length: 128,
            ..Default::default()
        };
        let config = translation_config(
            &ModelSpec::new("ENGLISH-HINDI", "Helsinki-NLP/opus-mt-en-hi"),
            None,
            &settings,
        );
        assert_eq!(config.max_length, Some(128));
    }

    #[test]
    fn test_romance_config_for_french_and_spanish() {
        for (key, code, language) in [
            ("ENGLISH-FRENCH", "fr", Language::French),
            ("ENGLISH-SPANISH", "es", Language::Spanish),
        ] {
            let spec = romance(key, code);
            let target = target_language(&spec).unwrap();
            assert_eq!(target, Some(language));

            let config = translation_config(&spec, target, &GenerationSettings::default());
            assert!(config.source_languages.contains(&Language::English));
            assert!(config.target_languages.contains(&language));
            // More than one target is what makes rust-bert emit the prefix
            assert!(config.target_languages.len() > 1);
        }

        let files = ModelFiles::hub("Helsinki-NLP/opus-mt-en-ROMANCE");
        assert_eq!(
            files.model.url,
            "https://huggingface.co/Helsinki-NLP/opus-mt-en-ROMANCE/resolve/main/rust_model.ot"
        );
        assert_eq!(
            files.spm.url,
            "https://huggingface.co/Helsinki-NLP/opus-mt-en-ROMANCE/resolve/main/source.spm"
        );
    }

    #[test]
    fn test_single_direction_model_has_no_target() {
        let spec = ModelSpec::new("ENGLISH-ARABIC", "Helsinki-NLP/opus-mt-en-ar");
        assert_eq!(target_language(&spec).unwrap(), None);
    }

    #[test]
    fn test_unsupported_target_language_rejected() {
        let spec = romance("ENGLISH-KLINGON", "tlh");
        assert!(matches!(
            target_language(&spec),
            Err(TranslationError::ConfigError { .. })
        ));
    }

    #[test]
    fn test_local_files_layout() {
        let dir = Path::new("models/opus-mt-en-ur");
        let files = ModelFiles::local(dir);
        assert_eq!(files.model.local_path, dir.join("rust_model.ot"));
        assert_eq!(files.config.local_path, dir.join("config.json"));
        assert_eq!(files.vocab.local_path, dir.join("vocab.json"));
        assert_eq!(files.spm.local_path, dir.join("source.spm"));
    }

    #[test]
    fn test_unconverted_local_weights_fail_before_loading() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.json"), "{}").unwrap();
        let spec = ModelSpec::new("ENGLISH-URDU", "Helsinki-NLP/opus-mt-en-ur")
            .with_local_path(dir.path());

        match MarianEngine::spawn(&spec, &GenerationSettings::default()).unwrap_err() {
            TranslationError::ModelLoad { key, message, .. } => {
                assert_eq!(key, "ENGLISH-URDU");
                assert!(message.contains("rust_model.ot"));
                assert!(message.contains("convert_model.py"));
                assert!(!message.contains("config.json"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    #[ignore] // downloads Helsinki-NLP/opus-mt-en-ROMANCE
    async fn test_english_to_french() {
        let spec = romance("ENGLISH-FRENCH", "fr");
        let engine = MarianEngine::spawn(&spec, &GenerationSettings::default()).unwrap();

        let output = engine.translate("Hello, how are you?").await.unwrap();
        assert!(!output.is_empty());
        assert_ne!(output, "Hello, how are you?");
    }

    #[tokio::test(flavor = "multi_thread")]
    #[ignore] // downloads Helsinki-NLP/opus-mt-en-de
    async fn test_english_to_german() {
        let spec = ModelSpec::new("ENGLISH-GERMAN", "Helsinki-NLP/opus-mt-en-de");
        let engine = MarianEngine::spawn(&spec, &GenerationSettings::default()).unwrap();

        let output = engine.translate("Hello, how are you?").await.unwrap();
        assert!(!output.is_empty());
        assert_ne!(output, "Hello, how are you?");
    }

    #[tokio::test(flavor = "multi_thread")]
    #[ignore] // tries to download a model that does not exist
    async fn test_unknown_model_fails_to_load() {
        let spec = ModelSpec::new("ENGLISH-KLINGON", "Helsinki-NLP/opus-mt-en-tlh-missing");
        let err = MarianEngine::spawn(&spec, &GenerationSettings::default()).unwrap_err();
        assert!(matches!(err, TranslationError::ModelLoad { .. }));
    }
}
