//! Audio rendering of generated notes
//!
//! Two backends: a SoundFont renderer and a built-in sine synthesizer. The
//! SoundFont backend is tried first and the sine synthesizer covers for it
//! on any failure.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::midi::{clip_duration, NoteEvent};
use crate::engine::AudioBuffer;
use crate::error::{BgmError, Result};

/// Fade applied to the tail of every sine note (seconds)
pub const RELEASE_SECS: f64 = 0.01;

/// Silence rendered after the last SoundFont note so voices can decay (seconds)
pub const SOUNDFONT_TAIL_SECS: f64 = 1.0;

/// A backend that turns notes into audio
pub trait Synthesizer {
    fn name(&self) -> &str;

    /// Render `notes` at `sample_rate`. `midi` holds the same notes encoded as
    /// a Standard MIDI File, for backends that consume files.
    fn render(&self, notes: &[NoteEvent], midi: &[u8], sample_rate: u32) -> Result<AudioBuffer>;
}

/// Sum of sine waves, one per note, peak-normalized
#[derive(Debug, Clone, Default)]
pub struct SineSynthesizer;

impl SineSynthesizer {
    pub fn new() -> Self {
        Self
    }
}

impl Synthesizer for SineSynthesizer {
    fn name(&self) -> &str {
        "sine"
    }

    fn render(&self, notes: &[NoteEvent], _midi: &[u8], sample_rate: u32) -> Result<AudioBuffer> {
        let sr = sample_rate as f64;
        let total = (clip_duration(notes) * sr).ceil() as usize;
        let mut buffer = AudioBuffer::new(total, sample_rate);
        let release_len = (RELEASE_SECS * sr).round() as usize;

        for note in notes {
            let start = (note.start * sr).round() as usize;
            let end = ((note.end * sr).round() as usize).min(total);
            if end <= start {
                continue;
            }

            let len = end - start;
            let fade = release_len.min(len).max(1);
            let amplitude = note.velocity as f64 / 127.0;
            let omega = 2.0 * std::f64::consts::PI * note.frequency() / sr;

            for (i, sample) in buffer.samples[start..end].iter_mut().enumerate() {
                let remaining = len - i;
                let envelope = if remaining < fade {
                    remaining as f64 / fade as f64
                } else {
                    1.0
                };
                *sample += (amplitude * envelope * (omega * i as f64).sin()) as f32;
            }
        }

        buffer.normalize();
        Ok(buffer)
    }
}

/// Renders the MIDI file through a SoundFont
#[derive(Debug, Clone, Default)]
pub struct SoundFontSynthesizer {
    soundfont: Option<PathBuf>,
}

impl SoundFontSynthesizer {
    pub fn new(soundfont: Option<PathBuf>) -> Self {
        Self { soundfont }
    }

    fn failure(&self, reason: impl Into<String>) -> BgmError {
        BgmError::SynthesisError {
            backend: self.name().to_string(),
            reason: reason.into(),
        }
    }

    #[cfg(feature = "soundfont")]
    fn render_file(&self, path: &Path, midi: &[u8], sample_rate: u32) -> Result<AudioBuffer> {
        use rustysynth::{
            MidiFile, MidiFileSequencer, SoundFont, Synthesizer as RustySynth, SynthesizerSettings,
        };
        use std::io::{BufReader, Cursor};
        use std::sync::Arc;

        let file = std::fs::File::open(path)
            .map_err(|e| self.failure(format!("cannot open {}: {}", path.display(), e)))?;
        let sound_font = Arc::new(
            SoundFont::new(&mut BufReader::new(file))
                .map_err(|e| self.failure(format!("failed to load SoundFont: {:?}", e)))?,
        );

        let midi_file = Arc::new(
            MidiFile::new(&mut Cursor::new(midi))
                .map_err(|e| self.failure(format!("failed to parse MIDI: {:?}", e)))?,
        );

        let settings = SynthesizerSettings::new(sample_rate as i32);
        let synthesizer = RustySynth::new(&sound_font, &settings)
            .map_err(|e| self.failure(format!("failed to create synthesizer: {:?}", e)))?;

        let mut sequencer = MidiFileSequencer::new(synthesizer);
        sequencer.play(&midi_file, false);

        let total_secs = midi_file.get_length() + SOUNDFONT_TAIL_SECS;
        let sample_count = (sample_rate as f64 * total_secs) as usize;
        let mut left = vec![0f32; sample_count];
        let mut right = vec![0f32; sample_count];
        sequencer.render(&mut left[..], &mut right[..]);

        let mono = left
            .iter()
            .zip(&right)
            .map(|(l, r)| 0.5 * (l + r))
            .collect();

        let mut buffer = AudioBuffer::from_samples(mono, sample_rate);
        buffer.normalize();
        Ok(buffer)
    }

    #[cfg(not(feature = "soundfont"))]
    fn render_file(&self, _path: &Path, _midi: &[u8], _sample_rate: u32) -> Result<AudioBuffer> {
        Err(self.failure("SoundFont support not compiled. Build with --features soundfont"))
    }
}

impl Synthesizer for SoundFontSynthesizer {
    fn name(&self) -> &str {
        "soundfont"
    }

    fn render(&self, _notes: &[NoteEvent], midi: &[u8], sample_rate: u32) -> Result<AudioBuffer> {
        let path = self
            .soundfont
            .as_deref()
            .ok_or_else(|| self.failure("no SoundFont configured"))?;
        self.render_file(path, midi, sample_rate)
    }
}

/// Audio produced by one of the backends
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub buffer: AudioBuffer,
    /// Name of the backend that produced `buffer`
    pub backend: String,
    /// Why the primary backend was skipped, when it was
    pub fallback_reason: Option<String>,
}

/// Render with `primary`, falling back to `fallback` if it fails
pub fn render_with_fallback(
    primary: &dyn Synthesizer,
    fallback: &dyn Synthesizer,
    notes: &[NoteEvent],
    midi: &[u8],
    sample_rate: u32,
) -> Result<RenderOutput> {
    match primary.render(notes, midi, sample_rate) {
        Ok(buffer) => {
            info!(backend = primary.name(), "Rendered clip");
            Ok(RenderOutput {
                buffer,
                backend: primary.name().to_string(),
                fallback_reason: None,
            })
        }
        Err(e) => {
            warn!(
                primary = primary.name(),
                fallback = fallback.name(),
                error = %e,
                "Primary synthesizer failed, falling back"
            );
            let buffer = fallback.render(notes, midi, sample_rate)?;
            Ok(RenderOutput {
                buffer,
                backend: fallback.name().to_string(),
                fallback_reason: Some(e.to_string()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::midi::{notes_from_pitches, write_midi, PitchMapping};
    use approx::assert_relative_eq;

    const SR: u32 = 8000;

    struct FailingSynth;

    impl Synthesizer for FailingSynth {
        fn name(&self) -> &str {
            "failing"
        }

        fn render(&self, _: &[NoteEvent], _: &[u8], _: u32) -> Result<AudioBuffer> {
            Err(BgmError::SynthesisError {
                backend: "failing".to_string(),
                reason: "always".to_string(),
            })
        }
    }

    fn notes() -> Vec<NoteEvent> {
        notes_from_pitches(&[440.0, 523.25, 659.25], PitchMapping::Nearest, None)
    }

    #[test]
    fn test_sine_length_and_peak() {
        let notes = notes();
        let buffer = SineSynthesizer::new().render(&notes, &[], SR).unwrap();

        assert_eq!(buffer.sample_rate, SR);
        assert_eq!(buffer.num_samples(), (3.0 * SR as f64).ceil() as usize);
        assert_relative_eq!(buffer.peak(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_sine_release_ends_quiet() {
        let notes = notes();
        let buffer = SineSynthesizer::new().render(&notes, &[], SR).unwrap();
        let last = *buffer.samples.last().unwrap();
        assert!(last.abs() < 0.2, "tail sample {}", last);
    }

    #[test]
    fn test_sine_empty_notes() {
        let buffer = SineSynthesizer::new().render(&[], &[], SR).unwrap();
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_soundfont_without_path_fails() {
        let result = SoundFontSynthesizer::new(None).render(&notes(), &[], SR);
        assert!(matches!(result, Err(BgmError::SynthesisError { .. })));
    }

    #[test]
    fn test_soundfont_missing_file_falls_back_to_sine() {
        let notes = notes();
        let midi = write_midi(&notes).unwrap();
        let primary = SoundFontSynthesizer::new(Some(PathBuf::from("/nonexistent/font.sf2")));

        let output =
            render_with_fallback(&primary, &SineSynthesizer::new(), &notes, &midi, SR).unwrap();
        assert_eq!(output.backend, "sine");
        assert!(output.fallback_reason.is_some());
        assert!(!output.buffer.is_empty());
    }

    #[test]
    fn test_primary_success_skips_fallback() {
        let notes = notes();
        let output =
            render_with_fallback(&SineSynthesizer::new(), &FailingSynth, &notes, &[], SR).unwrap();
        assert_eq!(output.backend, "sine");
        assert!(output.fallback_reason.is_none());
    }

    #[test]
    fn test_fallback_failure_propagates() {
        let result = render_with_fallback(&FailingSynth, &FailingSynth, &notes(), &[], SR);
        assert!(matches!(result, Err(BgmError::SynthesisError { .. })));
    }
}
