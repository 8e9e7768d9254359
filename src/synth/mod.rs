//! Clip synthesis
//!
//! Pitch contour → notes → MIDI file → rendered audio.

pub mod midi;
pub mod render;

pub use midi::{
    clip_duration, note_durations, notes_from_pitches, write_midi, NoteEvent, PitchMapping,
};
pub use render::{
    render_with_fallback, RenderOutput, SineSynthesizer, SoundFontSynthesizer, Synthesizer,
};
