//! Composition model trait and core types
//!
//! Defines the interface every suggestion backend implements.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::analysis::MusicFeatures;
use crate::error::{BgmError, Result};

/// Raga used when the user doesn't name one
pub const DEFAULT_RAGA: &str = "Yaman";

/// Mood of the requested background music
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    #[default]
    Peaceful,
    Energetic,
    Sad,
    Meditative,
    Joyful,
}

impl Mood {
    pub const ALL: [Mood; 5] = [
        Mood::Peaceful,
        Mood::Energetic,
        Mood::Sad,
        Mood::Meditative,
        Mood::Joyful,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Peaceful => "Peaceful",
            Self::Energetic => "Energetic",
            Self::Sad => "Sad",
            Self::Meditative => "Meditative",
            Self::Joyful => "Joyful",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Peaceful => "Calm, settled phrases with long sustained notes",
            Self::Energetic => "Driving rhythm and fast melodic runs",
            Self::Sad => "Slow, descending lines that linger on the lower register",
            Self::Meditative => "Drone-centred, sparse and unhurried",
            Self::Joyful => "Bright, bouncing phrases in the upper register",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mood {
    type Err = BgmError;

    fn from_str(s: &str) -> Result<Self> {
        Mood::ALL
            .iter()
            .copied()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| BgmError::InvalidParameter {
                param: "mood".to_string(),
                value: s.to_string(),
                expected: "Peaceful, Energetic, Sad, Meditative, or Joyful".to_string(),
            })
    }
}

/// What the user asked for, plus the statistics sent along with it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionRequest {
    pub raga: String,
    pub mood: Mood,
    pub tempo_bpm: f32,
    pub average_pitch_hz: f32,
}

impl CompositionRequest {
    pub fn new(raga: impl Into<String>, mood: Mood, features: &MusicFeatures) -> Self {
        Self {
            raga: raga.into(),
            mood,
            tempo_bpm: features.tempo_bpm,
            average_pitch_hz: features.average_pitch_hz,
        }
    }

    /// Reject requests no backend can answer
    pub fn validate(&self) -> Result<()> {
        if self.raga.trim().is_empty() {
            return Err(BgmError::InvalidParameter {
                param: "raga".to_string(),
                value: "<empty>".to_string(),
                expected: format!("a raga name such as '{}'", DEFAULT_RAGA),
            });
        }
        Ok(())
    }
}

/// Build the text prompt sent to the language model
pub fn build_prompt(request: &CompositionRequest) -> String {
    format!(
        "I am analyzing an Indian classical music piece with an average pitch of {:.2} Hz \
         and a tempo of {:.2} BPM.\n\
         The user wants to generate a new background music (BGM) based on the raga {} \
         with a {} mood.\n\
         Suggest a melody structure, note sequences, and rhythmic pattern for a new composition.",
        request.average_pitch_hz,
        request.tempo_bpm,
        request.raga.trim(),
        request.mood
    )
}

/// Suggestion text returned by a backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositionSuggestion {
    pub text: String,
    /// Identifier of the model that produced the text
    pub model_id: String,
    pub processing_time_ms: u64,
}

/// Information about a composition backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposerInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Whether the backend needs network access
    pub remote: bool,
}

/// Trait all composition backends implement
pub trait CompositionModel {
    fn info(&self) -> &ComposerInfo;

    /// Whether the backend can be called right now
    fn is_available(&self) -> bool {
        true
    }

    /// Ask for composition suggestions
    fn suggest(&self, request: &CompositionRequest) -> Result<CompositionSuggestion>;
}
