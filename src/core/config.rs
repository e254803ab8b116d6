//! Configuration management

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

use crate::core::errors::{Result, TranslationError};
use crate::core::models::ModelSpec;

/// Where generation runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreference {
    /// Always CPU
    Cpu,
    /// First CUDA device
    Cuda,
    /// CUDA when available, CPU otherwise
    Auto,
}

impl fmt::Display for DevicePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DevicePreference::Cpu => write!(f, "cpu"),
            DevicePreference::Cuda => write!(f, "cuda"),
            DevicePreference::Auto => write!(f, "auto"),
        }
    }
}

impl FromStr for DevicePreference {
    type Err = TranslationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "cpu" => Ok(DevicePreference::Cpu),
            "cuda" | "gpu" => Ok(DevicePreference::Cuda),
            "auto" => Ok(DevicePreference::Auto),
            other => Err(TranslationError::config(format!("unknown device: {}", other))),
        }
    }
}

/// Encode/generate parameters handed to every engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Beam width
    pub num_beams: i64,
    /// Output length cap, also the prompt truncation length
    pub max_length: i64,
    /// Stop a beam once it emits end-of-sequence
    pub early_stopping: bool,
    /// Where models are placed
    pub device: DevicePreference,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            num_beams: 4,
            max_length: 512,
            early_stopping: true,
            device: DevicePreference::Auto,
        }
    }
}

/// Configuration for the translator service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Bind host
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Language pairs, in display order
    pub models: Vec<ModelSpec>,
    /// Shared generation parameters
    pub generation: GenerationSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            models: vec![],
            generation: GenerationSettings::default(),
        }
    }
}

/// Multi-target model serving French and Spanish through a `>>xx<<` prefix
const ROMANCE_MODEL: &str = "Helsinki-NLP/opus-mt-en-ROMANCE";

/// Where converted Urdu weights are expected; the hub has no `rust_model.ot` for it
const URDU_WEIGHTS_DIR: &str = "models/opus-mt-en-ur";

/// Read an env var and parse it, falling back to `default` when unset
fn env_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| TranslationError::config(format!("{}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

impl AppConfig {
    /// Default model table as specs
    pub fn default_models() -> Vec<ModelSpec> {
        vec![
            ModelSpec::new("ENGLISH-URDU", "Helsinki-NLP/opus-mt-en-ur")
                .with_local_path(URDU_WEIGHTS_DIR),
            ModelSpec::new("ENGLISH-HINDI", "Helsinki-NLP/opus-mt-en-hi"),
            ModelSpec::new("ENGLISH-FRENCH", ROMANCE_MODEL).with_target_language("fr"),
            ModelSpec::new("ENGLISH-SPANISH", ROMANCE_MODEL).with_target_language("es"),
            ModelSpec::new("ENGLISH-ARABIC", "Helsinki-NLP/opus-mt-en-ar"),
            ModelSpec::new("ENGLISH-GERMAN", "Helsinki-NLP/opus-mt-en-de"),
        ]
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let generation = GenerationSettings {
            num_beams: env_or("NUM_BEAMS", defaults.generation.num_beams)?,
            max_length: env_or("MAX_LENGTH", defaults.generation.max_length)?,
            early_stopping: env_or("EARLY_STOPPING", defaults.generation.early_stopping)?,
            device: env_or("TRANSLATOR_DEVICE", defaults.generation.device)?,
        };

        Ok(Self {
            host: std::env::var("TRANSLATOR_HOST").unwrap_or(defaults.host),
            port: env_or("TRANSLATOR_PORT", defaults.port)?,
            models: vec![],
            generation,
        })
    }

    /// Load configuration with default models
    pub fn load() -> Result<Self> {
        let config = Self::from_env()?;
        Ok(config.with_default_models())
    }

    /// Fill in the default language pairs if none are configured
    pub fn with_default_models(mut self) -> Self {
        if self.models.is_empty() {
            self.models = Self::default_models();
            info!("Loaded {} default language pairs", self.models.len());
        }
        self
    }

    /// Load from a JSON or YAML file, picked by extension
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: Self = if is_yaml(path) {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };
        Ok(config.with_default_models())
    }

    /// Save configuration to file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = if is_yaml(path) {
            serde_yaml::to_string(self)?
        } else {
            serde_json::to_string_pretty(self)?
        };
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.models.is_empty() {
            return Err(TranslationError::config("at least one language pair is required"));
        }

        let mut seen = HashSet::new();
        for spec in &self.models {
            if spec.key.trim().is_empty() {
                return Err(TranslationError::config("language pair key cannot be empty"));
            }
            if spec.model_id.trim().is_empty() {
                return Err(TranslationError::config(format!(
                    "model identifier for {} cannot be empty",
                    spec.key
                )));
            }
            if matches!(&spec.target_language, Some(code) if code.trim().is_empty()) {
                return Err(TranslationError::config(format!(
                    "target language for {} cannot be empty",
                    spec.key
                )));
            }
            if !seen.insert(spec.key.as_str()) {
                return Err(TranslationError::DuplicateLanguagePair {
                    key: spec.key.clone(),
                });
            }
        }

        if self.generation.num_beams < 1 {
            return Err(TranslationError::config("num_beams must be greater than 0"));
        }

        if self.generation.max_length < 1 {
            return Err(TranslationError::config("max_length must be greater than 0"));
        }

        Ok(())
    }

    /// Find the spec for a language pair
    pub fn find_model(&self, key: &str) -> Option<&ModelSpec> {
        self.models.iter().find(|m| m.key == key)
    }

    /// Bind address as `host:port`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}
