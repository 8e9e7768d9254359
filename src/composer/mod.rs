//! Composition suggestions
//!
//! This module provides:
//! - `CompositionModel` trait for all suggestion backends
//! - Gemini cloud model
//! - Mock implementation for offline runs and tests

mod gemini;
mod mock;
mod model;

pub use gemini::GeminiModel;
pub use mock::MockComposer;
pub use model::{
    build_prompt, ComposerInfo, CompositionModel, CompositionRequest, CompositionSuggestion,
    Mood, DEFAULT_RAGA,
};

use crate::config::{ComposerConfig, ComposerKind};

/// Construct the backend selected by `config`
pub fn create_composer(config: &ComposerConfig) -> Box<dyn CompositionModel> {
    match config.kind {
        ComposerKind::Gemini => Box::new(GeminiModel::new(config)),
        ComposerKind::Mock => Box::new(MockComposer::new()),
    }
}
