//! The translator: transform chains plus an estimator, fitted together.

pub mod config;
pub mod translator;

pub use config::TranslatorConfig;
pub use translator::{LatentTranslator, Translation};
