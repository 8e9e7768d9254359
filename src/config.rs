//! Runtime configuration
//!
//! Settings are layered: built-in defaults, then an optional JSON file, then
//! environment variables. CLI flags are applied last by the binary.

use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::ANALYSIS_SAMPLE_RATE;
use crate::error::{BgmError, Result};
use crate::synth::PitchMapping;

pub const ENV_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_GEMINI_MODEL: &str = "RAGA_BGM_GEMINI_MODEL";
pub const ENV_GEMINI_URL: &str = "RAGA_BGM_GEMINI_URL";
pub const ENV_TIMEOUT_MS: &str = "RAGA_BGM_TIMEOUT_MS";
pub const ENV_SOUNDFONT: &str = "RAGA_BGM_SOUNDFONT";

pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Which backend produces composition suggestions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComposerKind {
    #[default]
    Gemini,
    Mock,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComposerConfig {
    pub kind: ComposerKind,
    /// Never written back out
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout_ms: u64,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            kind: ComposerKind::Gemini,
            api_key: None,
            base_url: DEFAULT_GEMINI_URL.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            timeout_ms: 60_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SynthConfig {
    /// SoundFont for the primary synthesizer; the sine fallback is used without one
    pub soundfont: Option<PathBuf>,
    pub pitch_mapping: PitchMapping,
    /// Keep at most this many notes from the pitch contour
    pub max_notes: Option<usize>,
    /// Bit depth of the rendered WAV (16, 24 or 32)
    pub bit_depth: u16,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            soundfont: None,
            pitch_mapping: PitchMapping::default(),
            max_notes: None,
            bit_depth: 16,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BgmConfig {
    pub composer: ComposerConfig,
    pub synth: SynthConfig,
    /// Recordings are resampled to this rate before analysis
    pub analysis_sample_rate: u32,
    /// File stem shared by all generated outputs
    pub output_stem: String,
}

impl Default for BgmConfig {
    fn default() -> Self {
        Self {
            composer: ComposerConfig::default(),
            synth: SynthConfig::default(),
            analysis_sample_rate: ANALYSIS_SAMPLE_RATE,
            output_stem: "generated_bgm".to_string(),
        }
    }
}

impl BgmConfig {
    /// Read a JSON config file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| BgmError::FileNotFound {
            path: path.display().to_string(),
            source: Some(e),
        })?;
        serde_json::from_str(&text).map_err(|e| BgmError::ConfigError {
            reason: format!("{}: {}", path.display(), e),
        })
    }

    /// Defaults, overlaid with `path` when given, then the process environment
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::load(p)?,
            None => Self::default(),
        };
        config.apply_env(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_API_KEY).filter(|k| !k.trim().is_empty()) {
            debug!("Using API key from {}", ENV_API_KEY);
            self.composer.api_key = Some(key);
        }
        if let Some(model) = lookup(ENV_GEMINI_MODEL) {
            self.composer.model = model;
        }
        if let Some(url) = lookup(ENV_GEMINI_URL) {
            self.composer.base_url = url;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            self.composer.timeout_ms = raw.parse().map_err(|_| BgmError::ConfigError {
                reason: format!("{} must be a number of milliseconds, got '{}'", ENV_TIMEOUT_MS, raw),
            })?;
        }
        if let Some(sf) = lookup(ENV_SOUNDFONT) {
            self.synth.soundfont = Some(PathBuf::from(sf));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.analysis_sample_rate < 4000 {
            return Err(BgmError::ConfigError {
                reason: format!(
                    "analysis_sample_rate {} is too low (minimum 4000)",
                    self.analysis_sample_rate
                ),
            });
        }
        if !matches!(self.synth.bit_depth, 16 | 24 | 32) {
            return Err(BgmError::ConfigError {
                reason: format!("synth.bit_depth must be 16, 24 or 32, got {}", self.synth.bit_depth),
            });
        }
        if self.output_stem.trim().is_empty() || self.output_stem.contains(['/', '\\']) {
            return Err(BgmError::ConfigError {
                reason: format!("output_stem '{}' is not a plain file name", self.output_stem),
            });
        }
        if self.composer.timeout_ms == 0 {
            return Err(BgmError::ConfigError {
                reason: "composer.timeout_ms must be positive".to_string(),
            });
        }
        Ok(())
    }
}
