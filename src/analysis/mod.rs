//! Musical feature extraction
//!
//! Coarse statistics of a recording: global tempo and a per-frame pitch
//! contour, both computed from the same STFT parameters.

pub mod pitch;
pub mod stft;
pub mod tempo;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::engine::AudioBuffer;
use crate::error::Result;

pub use pitch::{average_pitch, track_pitches};
pub use tempo::estimate_tempo;

/// Features extracted from one recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicFeatures {
    /// Global tempo estimate (BPM), 0.0 when none was found
    pub tempo_bpm: f32,
    /// Pitch of every voiced frame (Hz), in time order
    pub pitch_values: Vec<f32>,
    /// Mean of `pitch_values`, 0.0 when there are none
    pub average_pitch_hz: f32,
    pub sample_rate: u32,
    pub duration_secs: f64,
}

/// Run tempo and pitch analysis over `buffer`
pub fn analyze(buffer: &AudioBuffer) -> Result<MusicFeatures> {
    buffer.validate_for_analysis()?;

    let tempo_bpm = estimate_tempo(buffer);
    let pitch_values = track_pitches(buffer);
    let average_pitch_hz = average_pitch(&pitch_values);

    debug!(voiced_frames = pitch_values.len(), "Pitch tracking complete");
    info!(
        tempo_bpm = format!("{:.2}", tempo_bpm),
        average_pitch_hz = format!("{:.2}", average_pitch_hz),
        "Music analysis"
    );

    Ok(MusicFeatures {
        tempo_bpm,
        pitch_values,
        average_pitch_hz,
        sample_rate: buffer.sample_rate,
        duration_secs: buffer.duration_secs(),
    })
}
