//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::cli::{ComposerArg, PitchMappingArg};
use crate::composer::Mood;
use crate::config::BgmConfig;
use crate::error::{BgmError, Result};
use crate::pipeline::Pipeline;

/// Per-run overrides from the `generate` flags
#[derive(Debug, Clone, Default)]
pub struct GenerateOverrides {
    pub composer: Option<ComposerArg>,
    pub soundfont: Option<PathBuf>,
    pub pitch_mapping: Option<PitchMappingArg>,
    pub max_notes: Option<usize>,
}

impl GenerateOverrides {
    pub fn apply(&self, config: &mut BgmConfig) {
        if let Some(kind) = self.composer {
            config.composer.kind = kind.into();
        }
        if let Some(sf) = &self.soundfont {
            config.synth.soundfont = Some(sf.clone());
        }
        if let Some(mapping) = self.pitch_mapping {
            config.synth.pitch_mapping = mapping.into();
        }
        if let Some(max) = self.max_notes {
            config.synth.max_notes = Some(max);
        }
    }
}

/// Print the features of a recording.
pub fn analyze(config: BgmConfig, input: &Path, json: bool) -> Result<()> {
    let pipeline = Pipeline::new(config);
    let features = pipeline.analyze(input)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&features)?);
        return Ok(());
    }

    println!("Music Analysis: {}", input.display());
    println!("{:-<60}", "");
    println!("Tempo:         {:.2} BPM", features.tempo_bpm);
    println!("Average Pitch: {:.2} Hz", features.average_pitch_hz);
    println!("Voiced frames: {}", features.pitch_values.len());
    println!("Duration:      {:.2} s", features.duration_secs);

    Ok(())
}

/// Run the full generation pipeline.
pub fn generate(
    mut config: BgmConfig,
    input: &Path,
    raga: &str,
    mood: Mood,
    output_dir: &Path,
    overrides: &GenerateOverrides,
) -> Result<()> {
    overrides.apply(&mut config);
    config.validate()?;

    let pipeline = Pipeline::new(config);
    if !pipeline.composer().is_available() {
        warn!(
            "Composer '{}' is not available; the request will likely fail",
            pipeline.composer().info().id
        );
    }

    let outcome = pipeline.generate(input, raga, mood, output_dir)?;

    println!("Music Analysis");
    println!("{:-<60}", "");
    println!("Tempo:         {:.2} BPM", outcome.features.tempo_bpm);
    println!("Average Pitch: {:.2} Hz", outcome.features.average_pitch_hz);

    println!("\nAI-Generated Composition ({})", outcome.suggestion.model_id);
    println!("{:-<60}", "");
    println!("{}", outcome.suggestion.text.trim_end());
    println!("{:-<60}", "");

    println!("\nNew BGM generated:");
    println!("  MIDI:       {}", outcome.midi_path.display());
    println!(
        "  Audio:      {} ({} synthesizer, {:.1} s)",
        outcome.wav_path.display(),
        outcome.report.synth_backend,
        outcome.report.clip_duration_secs
    );
    println!("  Suggestion: {}", outcome.suggestion_path.display());
    println!("  Report:     {}", outcome.report_path.display());
    if let Some(reason) = &outcome.report.synth_fallback_reason {
        println!("Note: SoundFont rendering unavailable ({}), used sine fallback", reason);
    }

    Ok(())
}

/// Text printed to stderr when a command fails
pub fn error_report(err: &BgmError) -> String {
    let mut report = format!("[{}] {}\n", err.error_code(), err.friendly_message());
    if err.is_recoverable() {
        for suggestion in err.recovery_suggestions() {
            report.push_str(&format!("  - {}\n", suggestion));
        }
    } else {
        report.push_str("  Rerun with --verbose for details\n");
    }
    report
}

/// List moods.
pub fn moods() -> Result<()> {
    println!("Available moods:");
    for mood in Mood::ALL {
        println!("  {:<12} {}", mood.as_str().to_lowercase(), mood.description());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ComposerKind;
    use crate::synth::PitchMapping;

    #[test]
    fn test_overrides_apply() {
        let mut config = BgmConfig::default();
        let overrides = GenerateOverrides {
            composer: Some(ComposerArg::Mock),
            soundfont: Some(PathBuf::from("piano.sf2")),
            pitch_mapping: Some(PitchMappingArg::Nearest),
            max_notes: Some(16),
        };
        overrides.apply(&mut config);

        assert_eq!(config.composer.kind, ComposerKind::Mock);
        assert_eq!(config.synth.soundfont, Some(PathBuf::from("piano.sf2")));
        assert_eq!(config.synth.pitch_mapping, PitchMapping::Nearest);
        assert_eq!(config.synth.max_notes, Some(16));
    }

    #[test]
    fn test_error_report_lists_suggestions() {
        let report = error_report(&BgmError::MissingApiKey {
            model: "gemini/gemini-1.5-flash".to_string(),
        });
        assert!(report.starts_with("[MISSING_API_KEY] "));
        assert!(report.contains("  - Set the GEMINI_API_KEY environment variable\n"));
        assert_eq!(report.matches("gemini/gemini-1.5-flash").count(), 1);
    }

    #[test]
    fn test_error_report_unrecoverable() {
        let report = error_report(&BgmError::MidiError {
            reason: "gap too long".to_string(),
        });
        assert!(report.starts_with("[MIDI_ERROR] MIDI encoding failed: gap too long\n"));
        assert!(report.contains("--verbose"));
        assert!(!report.contains("  - "));
    }

    #[test]
    fn test_empty_overrides_keep_config() {
        let mut config = BgmConfig::default();
        GenerateOverrides::default().apply(&mut config);
        assert_eq!(config, BgmConfig::default());
    }
}
