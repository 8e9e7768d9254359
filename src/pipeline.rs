//! Generation pipeline
//!
//! load → analyze → suggest → MIDI → render → write outputs, once per call.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::analysis::{self, MusicFeatures};
use crate::composer::{create_composer, CompositionModel, CompositionRequest, CompositionSuggestion, Mood};
use crate::config::BgmConfig;
use crate::engine::{load_audio, write_wav};
use crate::error::Result;
use crate::report::{OutputFile, RunReport};
use crate::synth::{
    clip_duration, notes_from_pitches, render_with_fallback, write_midi, SineSynthesizer,
    SoundFontSynthesizer,
};

/// Everything a generation run produced
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub features: MusicFeatures,
    pub suggestion: CompositionSuggestion,
    pub midi_path: PathBuf,
    pub wav_path: PathBuf,
    pub suggestion_path: PathBuf,
    pub report_path: PathBuf,
    pub report: RunReport,
}

pub struct Pipeline {
    config: BgmConfig,
    composer: Box<dyn CompositionModel>,
}

impl Pipeline {
    /// Pipeline with the composer named in `config`
    pub fn new(config: BgmConfig) -> Self {
        let composer = create_composer(&config.composer);
        Self { config, composer }
    }

    /// Pipeline with an explicit composer
    pub fn with_composer(config: BgmConfig, composer: Box<dyn CompositionModel>) -> Self {
        Self { config, composer }
    }

    pub fn composer(&self) -> &dyn CompositionModel {
        self.composer.as_ref()
    }

    /// Load `input` and extract its features
    pub fn analyze(&self, input: &Path) -> Result<MusicFeatures> {
        info!("Analyzing: {}", input.display());
        let buffer = load_audio(input, self.config.analysis_sample_rate)?;
        analysis::analyze(&buffer)
    }

    /// Run the full pipeline, writing outputs into `output_dir`
    pub fn generate(
        &self,
        input: &Path,
        raga: &str,
        mood: Mood,
        output_dir: &Path,
    ) -> Result<GenerationOutcome> {
        let features = self.analyze(input)?;

        let request = CompositionRequest::new(raga, mood, &features);
        request.validate()?;
        info!(
            composer = %self.composer.info().id,
            raga = %request.raga,
            mood = %request.mood,
            "Requesting composition suggestions"
        );
        let suggestion = self.composer.suggest(&request)?;

        let synth = &self.config.synth;
        let notes = notes_from_pitches(&features.pitch_values, synth.pitch_mapping, synth.max_notes);
        let midi = write_midi(&notes)?;
        info!(notes = notes.len(), "Built note sequence");

        std::fs::create_dir_all(output_dir)?;
        let stem = &self.config.output_stem;
        let midi_path = output_dir.join(format!("{}.mid", stem));
        let wav_path = output_dir.join(format!("{}.wav", stem));
        let suggestion_path = output_dir.join(format!("{}.txt", stem));
        let report_path = output_dir.join(format!("{}.json", stem));

        std::fs::write(&midi_path, &midi)?;

        let primary = SoundFontSynthesizer::new(synth.soundfont.clone());
        let rendered = render_with_fallback(
            &primary,
            &SineSynthesizer::new(),
            &notes,
            &midi,
            features.sample_rate,
        )?;
        write_wav(&rendered.buffer, &wav_path, synth.bit_depth)?;

        std::fs::write(&suggestion_path, &suggestion.text)?;

        let report = RunReport {
            run_id: Uuid::new_v4(),
            created_at: Utc::now(),
            input: input.to_path_buf(),
            raga: request.raga.trim().to_string(),
            mood,
            tempo_bpm: features.tempo_bpm,
            average_pitch_hz: features.average_pitch_hz,
            note_count: notes.len(),
            clip_duration_secs: clip_duration(&notes),
            synth_backend: rendered.backend,
            synth_fallback_reason: rendered.fallback_reason,
            composer_model: suggestion.model_id.clone(),
            suggestion: suggestion.text.clone(),
            pitch_contour: features.pitch_values.clone(),
            outputs: vec![
                OutputFile::describe(&midi_path, &midi),
                OutputFile::from_disk(&wav_path)?,
                OutputFile::describe(&suggestion_path, suggestion.text.as_bytes()),
            ],
        };
        report.write(&report_path)?;
        info!(run_id = %report.run_id, "New BGM generated in {}", output_dir.display());

        Ok(GenerationOutcome {
            features,
            suggestion,
            midi_path,
            wav_path,
            suggestion_path,
            report_path,
            report,
        })
    }
}
