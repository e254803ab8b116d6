//! Language Translator - web form over pretrained Marian translation models
//!
//! A fixed set of language pairs is loaded at startup into a read-only
//! [`ModelRegistry`]. The HTTP server renders a form, routes each submission to
//! the model for the selected pair and shows the result next to the input.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod core;
pub mod server;
pub mod cli;

// Re-export key types for convenience
pub use crate::core::{
    config::{AppConfig, DevicePreference, GenerationSettings},
    engine::{EngineLoader, TranslationEngine},
    errors::TranslationError,
    models::{ModelSpec, TranslationOutcome, TranslationRequest, MODEL_UNAVAILABLE_MESSAGE},
    registry::{ModelEntry, ModelRegistry},
    translator::Translator,
};

#[cfg(feature = "marian")]
pub use crate::core::marian::MarianEngine;

pub use server::view::{HtmlRenderer, PageRenderer};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
