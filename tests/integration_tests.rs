//! Integration Tests
//!
//! End-to-end tests for the analysis → suggestion → synthesis pipeline.

use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use midly::{MidiMessage, Smf, TrackEventKind};
use pretty_assertions::assert_eq;
use tempfile::tempdir;
use test_case::test_case;

use raga_bgm::composer::{
    CompositionModel, CompositionRequest, CompositionSuggestion, ComposerInfo, MockComposer, Mood,
};
use raga_bgm::config::{BgmConfig, ComposerKind};
use raga_bgm::engine::load_audio;
use raga_bgm::pipeline::Pipeline;
use raga_bgm::report::{sha256_hex, RunReport};
use raga_bgm::synth::{PitchMapping, NoteEvent};
use raga_bgm::{BgmError, Result};

const SR: u32 = 44100;

/// Stereo 16-bit recording: a drone plus plucked notes on a steady pulse
fn write_recording(path: &Path, bpm: f64, duration_secs: f64) {
    let spec = WavSpec {
        channels: 2,
        sample_rate: SR,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).unwrap();

    let total = (duration_secs * SR as f64) as usize;
    let period = (60.0 / bpm * SR as f64) as usize;
    let melody = [261.63, 293.66, 329.63, 369.99, 392.0];

    for i in 0..total {
        let t = i as f64 / SR as f64;
        let beat = i / period;
        let since_onset = (i % period) as f64 / SR as f64;
        let freq = melody[beat % melody.len()];

        let drone = 0.1 * (2.0 * std::f64::consts::PI * 130.81 * t).sin();
        let pluck = 0.6 * (-since_onset * 12.0).exp() * (2.0 * std::f64::consts::PI * freq * t).sin();
        let sample = ((drone + pluck) * 32767.0 * 0.8) as i16;

        writer.write_sample(sample).unwrap();
        writer.write_sample(sample).unwrap();
    }
    writer.finalize().unwrap();
}

fn mock_config(max_notes: usize) -> BgmConfig {
    let mut config = BgmConfig::default();
    config.composer.kind = ComposerKind::Mock;
    config.synth.max_notes = Some(max_notes);
    config
}

/// Composer that records nothing and always refuses
struct OfflineComposer {
    info: ComposerInfo,
}

impl CompositionModel for OfflineComposer {
    fn info(&self) -> &ComposerInfo {
        &self.info
    }

    fn is_available(&self) -> bool {
        false
    }

    fn suggest(&self, _request: &CompositionRequest) -> Result<CompositionSuggestion> {
        Err(BgmError::ComposerUnavailable {
            reason: "offline".to_string(),
        })
    }
}

// === Analysis ===

#[test]
fn test_analysis_of_recording() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("alaap.wav");
    write_recording(&input, 100.0, 8.0);

    let features = Pipeline::new(mock_config(16)).analyze(&input).unwrap();

    assert_eq!(features.sample_rate, 22050);
    assert!((features.duration_secs - 8.0).abs() < 0.01);
    assert!(features.tempo_bpm > 0.0);
    assert!(!features.pitch_values.is_empty());
    assert!(features.pitch_values.iter().all(|&p| p > 0.0));
    assert!(features.average_pitch_hz >= 150.0 && features.average_pitch_hz < 4000.0);
}

#[test]
fn test_analysis_is_deterministic() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("alaap.wav");
    write_recording(&input, 120.0, 4.0);

    let pipeline = Pipeline::new(mock_config(16));
    assert_eq!(
        pipeline.analyze(&input).unwrap(),
        pipeline.analyze(&input).unwrap()
    );
}

#[test]
fn test_analysis_missing_file() {
    let result = Pipeline::new(mock_config(16)).analyze(Path::new("/nonexistent/alaap.wav"));
    assert!(matches!(result, Err(BgmError::FileNotFound { .. })));
}

// === Full pipeline ===

#[test_case(Mood::Peaceful ; "peaceful")]
#[test_case(Mood::Energetic ; "energetic")]
#[test_case(Mood::Joyful ; "joyful")]
fn test_generate_end_to_end(mood: Mood) {
    let dir = tempdir().unwrap();
    let input = dir.path().join("alaap.wav");
    write_recording(&input, 90.0, 4.0);
    let out = dir.path().join("out");

    let outcome = Pipeline::new(mock_config(12))
        .generate(&input, "Yaman", mood, &out)
        .unwrap();

    // MIDI: 12 note-ons on a single track
    let midi = std::fs::read(&outcome.midi_path).unwrap();
    let smf = Smf::parse(&midi).unwrap();
    let note_ons = smf.tracks[0]
        .iter()
        .filter(|e| {
            matches!(
                e.kind,
                TrackEventKind::Midi {
                    message: MidiMessage::NoteOn { .. },
                    ..
                }
            )
        })
        .count();
    assert_eq!(note_ons, 12);

    // WAV: analysis sample rate, 12 notes spanning 12s
    let rendered = load_audio(&outcome.wav_path, 22050).unwrap();
    assert!((rendered.duration_secs() - 12.0).abs() < 0.01);
    assert!(rendered.peak() > 0.9);

    // Suggestion text mirrors the request
    let text = std::fs::read_to_string(&outcome.suggestion_path).unwrap();
    assert!(text.contains("Raga Yaman"));
    assert!(text.contains(mood.as_str()));

    // Report checksums match files on disk
    let report = RunReport::load(&outcome.report_path).unwrap();
    assert_eq!(report.mood, mood);
    assert_eq!(report.note_count, 12);
    assert_eq!(report.composer_model, "mock");
    assert_eq!(report.pitch_contour, outcome.features.pitch_values);
    for output in &report.outputs {
        let bytes = std::fs::read(&output.path).unwrap();
        assert_eq!(output.sha256, sha256_hex(&bytes));
        assert_eq!(output.bytes, bytes.len() as u64);
    }
}

#[test]
fn test_generate_with_missing_soundfont_falls_back() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("alaap.wav");
    write_recording(&input, 120.0, 2.0);

    let mut config = mock_config(4);
    config.synth.soundfont = Some(dir.path().join("missing.sf2"));
    config.synth.pitch_mapping = PitchMapping::Nearest;

    let outcome = Pipeline::new(config)
        .generate(&input, "Bhairav", Mood::Meditative, dir.path())
        .unwrap();

    assert_eq!(outcome.report.synth_backend, "sine");
    assert!(outcome.report.synth_fallback_reason.is_some());
}

#[test]
fn test_composer_failure_aborts_run() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("alaap.wav");
    write_recording(&input, 120.0, 2.0);
    let out = dir.path().join("out");

    let composer = OfflineComposer {
        info: ComposerInfo {
            id: "offline".to_string(),
            name: "Offline".to_string(),
            description: "Always refuses".to_string(),
            remote: true,
        },
    };
    let pipeline = Pipeline::with_composer(mock_config(4), Box::new(composer));
    assert!(!pipeline.composer().is_available());

    let err = pipeline
        .generate(&input, "Yaman", Mood::Peaceful, &out)
        .unwrap_err();
    assert_eq!(err.error_code(), "COMPOSER_UNAVAILABLE");
    assert!(!out.join("generated_bgm.mid").exists());
}

#[test]
fn test_gemini_without_key_reports_missing_key() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("alaap.wav");
    write_recording(&input, 120.0, 2.0);

    let mut config = mock_config(4);
    config.composer.kind = ComposerKind::Gemini;
    config.composer.api_key = None;

    let err = Pipeline::new(config)
        .generate(&input, "Yaman", Mood::Sad, dir.path())
        .unwrap_err();
    assert!(matches!(err, BgmError::MissingApiKey { .. }));
    assert!(!err.recovery_suggestions().is_empty());
}

#[test]
fn test_custom_output_stem() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("alaap.wav");
    write_recording(&input, 120.0, 2.0);

    let mut config = mock_config(3);
    config.output_stem = "yaman_sketch".to_string();

    let outcome = Pipeline::with_composer(config, Box::new(MockComposer::new()))
        .generate(&input, "Yaman", Mood::Peaceful, dir.path())
        .unwrap();

    assert!(outcome.midi_path.ends_with("yaman_sketch.mid"));
    assert!(outcome.wav_path.ends_with("yaman_sketch.wav"));
    assert!(outcome.report_path.ends_with("yaman_sketch.json"));
}

#[test]
fn test_note_events_serialize() {
    let note = NoteEvent {
        pitch: 60,
        velocity: 100,
        start: 0.0,
        end: 0.5,
    };
    let json = serde_json::to_value(note).unwrap();
    assert_eq!(json["pitch"], 60);
    assert_eq!(json["end"], 0.5);
}
