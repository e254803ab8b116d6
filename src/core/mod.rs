//! Core translation engine module

pub mod config;
pub mod engine;
pub mod errors;
#[cfg(feature = "marian")]
pub mod marian;
pub mod models;
pub mod registry;
pub mod translator;
