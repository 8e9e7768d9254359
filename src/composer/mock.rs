//! Offline composition model
//!
//! Produces a deterministic suggestion from the request alone, so the full
//! pipeline runs without network access or an API key.

use std::time::Instant;

use super::model::{ComposerInfo, CompositionModel, CompositionRequest, CompositionSuggestion, Mood};
use crate::error::Result;

/// Swaras of the middle octave, Sa through Ni
const SWARAS: [&str; 7] = ["Sa", "Re", "Ga", "Ma", "Pa", "Dha", "Ni"];

/// Index into `SWARAS` for each semitone above Sa; komal and tivra
/// positions take the name of their shuddha swara
const SWARA_OF_SEMITONE: [usize; 12] = [0, 1, 1, 2, 2, 3, 3, 4, 5, 5, 6, 6];

/// Sa of the phrase table (middle C)
const SA_HZ: f32 = 261.63;

/// Mock composer used for testing and offline runs
pub struct MockComposer {
    info: ComposerInfo,
}

impl MockComposer {
    pub fn new() -> Self {
        Self {
            info: ComposerInfo {
                id: "mock".to_string(),
                name: "Mock Composer".to_string(),
                description: "Template-based composition notes (MOCK)".to_string(),
                remote: false,
            },
        }
    }

    /// Tala suited to the mood at the analysed tempo
    fn rhythm(mood: Mood, tempo_bpm: f32) -> &'static str {
        match mood {
            Mood::Energetic | Mood::Joyful if tempo_bpm >= 100.0 => "drut teentaal (16 beats)",
            Mood::Energetic | Mood::Joyful => "madhya laya keherwa (8 beats)",
            Mood::Sad => "vilambit ektaal (12 beats)",
            Mood::Meditative => "slow jhaptaal (10 beats) over a tanpura drone",
            Mood::Peaceful => "madhya laya rupak (7 beats)",
        }
    }

    /// Ascending phrase starting from a swara derived from the average pitch
    fn phrase(average_pitch_hz: f32) -> String {
        let offset = if average_pitch_hz > 0.0 {
            let semitone = (12.0 * (average_pitch_hz / SA_HZ).log2()).round().rem_euclid(12.0);
            SWARA_OF_SEMITONE[semitone as usize % 12]
        } else {
            0
        };
        (0..5)
            .map(|i| SWARAS[(offset + i) % SWARAS.len()])
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for MockComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl CompositionModel for MockComposer {
    fn info(&self) -> &ComposerInfo {
        &self.info
    }

    fn suggest(&self, request: &CompositionRequest) -> Result<CompositionSuggestion> {
        request.validate()?;
        let start = Instant::now();

        let text = format!(
            "Raga {raga}, {mood} mood (MOCK)\n\
             Melody structure: alaap introducing the raga, then sthayi and antara sections.\n\
             Note sequence: {phrase}, resolving back to Sa.\n\
             Rhythmic pattern: {rhythm} at about {tempo:.0} BPM.\n\
             Character: {character}.",
            raga = request.raga.trim(),
            mood = request.mood,
            phrase = Self::phrase(request.average_pitch_hz),
            rhythm = Self::rhythm(request.mood, request.tempo_bpm),
            tempo = request.tempo_bpm,
            character = request.mood.description(),
        );

        Ok(CompositionSuggestion {
            text,
            model_id: self.info.id.clone(),
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}
