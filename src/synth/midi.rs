//! Note generation and Standard MIDI File encoding
//!
//! The detected pitch contour becomes a monophonic line: one note per pitch,
//! back to back, with durations growing linearly from 0.5s to 1.5s.

use midly::num::{u15, u24, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use serde::{Deserialize, Serialize};

use crate::error::{BgmError, Result};

/// Shortest note of the generated line (seconds)
pub const MIN_NOTE_SECS: f64 = 0.5;

/// Longest note of the generated line (seconds)
pub const MAX_NOTE_SECS: f64 = 1.5;

/// Velocity of every generated note
pub const NOTE_VELOCITY: u8 = 100;

/// MIDI resolution
pub const TICKS_PER_BEAT: u16 = 220;

/// Tempo written to the file (120 BPM)
pub const MICROSECONDS_PER_BEAT: u32 = 500_000;

/// General MIDI program 0, acoustic grand piano
pub const PROGRAM: u8 = 0;

/// Largest delta time a track event can carry (28 bits)
const MAX_DELTA_TICKS: u64 = (1 << 28) - 1;

/// How a frequency in Hz becomes a MIDI key number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PitchMapping {
    /// Whole hertz wrapped into 0..128
    #[default]
    Modulo,
    /// Nearest equal-tempered key, A4 = 440 Hz
    Nearest,
}

impl PitchMapping {
    pub fn to_key(self, hz: f32) -> u8 {
        match self {
            PitchMapping::Modulo => (hz.max(0.0) % 128.0) as u8,
            PitchMapping::Nearest => {
                if hz <= 0.0 {
                    return 0;
                }
                (69.0 + 12.0 * (hz / 440.0).log2()).round().clamp(0.0, 127.0) as u8
            }
        }
    }
}

/// One note of the generated clip
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub pitch: u8,
    pub velocity: u8,
    /// Onset (seconds)
    pub start: f64,
    /// Release (seconds)
    pub end: f64,
}

impl NoteEvent {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Equal-tempered frequency of the key (Hz)
    pub fn frequency(&self) -> f64 {
        440.0 * 2f64.powf((self.pitch as f64 - 69.0) / 12.0)
    }
}

/// `n` durations evenly spaced from `MIN_NOTE_SECS` to `MAX_NOTE_SECS` inclusive
pub fn note_durations(n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![MIN_NOTE_SECS],
        _ => {
            let step = (MAX_NOTE_SECS - MIN_NOTE_SECS) / (n - 1) as f64;
            (0..n).map(|i| MIN_NOTE_SECS + step * i as f64).collect()
        }
    }
}

/// Turn a pitch contour into consecutive notes
///
/// When `max_notes` is set only that many leading pitches are used, and the
/// duration ramp spans the shortened list.
pub fn notes_from_pitches(
    pitches: &[f32],
    mapping: PitchMapping,
    max_notes: Option<usize>,
) -> Vec<NoteEvent> {
    let used = &pitches[..max_notes.map_or(pitches.len(), |m| m.min(pitches.len()))];

    let mut start = 0.0;
    used.iter()
        .zip(note_durations(used.len()))
        .map(|(&hz, duration)| {
            let note = NoteEvent {
                pitch: mapping.to_key(hz),
                velocity: NOTE_VELOCITY,
                start,
                end: start + duration,
            };
            start += duration;
            note
        })
        .collect()
}

/// End time of the last note (seconds)
pub fn clip_duration(notes: &[NoteEvent]) -> f64 {
    notes.iter().map(|n| n.end).fold(0.0, f64::max)
}

fn seconds_to_ticks(secs: f64) -> u64 {
    let ticks_per_sec = TICKS_PER_BEAT as f64 * 1_000_000.0 / MICROSECONDS_PER_BEAT as f64;
    (secs * ticks_per_sec).round().max(0.0) as u64
}

/// Encode notes as a single-track Standard MIDI File
pub fn write_midi(notes: &[NoteEvent]) -> Result<Vec<u8>> {
    let channel = u4::new(0);

    // (tick, order, kind): note-offs sort ahead of note-ons at the same tick
    let mut timed: Vec<(u64, u8, TrackEventKind<'static>)> = Vec::with_capacity(notes.len() * 2);
    for note in notes {
        let key = u7::new(note.pitch.min(127));
        timed.push((
            seconds_to_ticks(note.start),
            1,
            TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOn {
                    key,
                    vel: u7::new(note.velocity.min(127)),
                },
            },
        ));
        timed.push((
            seconds_to_ticks(note.end),
            0,
            TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOff {
                    key,
                    vel: u7::new(0),
                },
            },
        ));
    }
    timed.sort_by_key(|(tick, order, _)| (*tick, *order));

    let mut track: Vec<TrackEvent<'static>> = vec![
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(MICROSECONDS_PER_BEAT))),
        },
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::ProgramChange {
                    program: u7::new(PROGRAM),
                },
            },
        },
    ];

    let mut last_tick = 0u64;
    for (tick, _, kind) in timed {
        let delta = tick - last_tick;
        if delta > MAX_DELTA_TICKS {
            return Err(BgmError::MidiError {
                reason: format!("gap of {} ticks exceeds the MIDI delta limit", delta),
            });
        }
        track.push(TrackEvent {
            delta: u28::new(delta as u32),
            kind,
        });
        last_tick = tick;
    }

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });

    let smf = Smf {
        header: Header::new(Format::SingleTrack, Timing::Metrical(u15::new(TICKS_PER_BEAT))),
        tracks: vec![track],
    };

    let mut buffer = Vec::new();
    smf.write(&mut buffer).map_err(|e| BgmError::MidiError {
        reason: format!("Failed to write MIDI: {}", e),
    })?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test]
    fn test_note_durations_endpoints() {
        let durations = note_durations(5);
        assert_eq!(durations.len(), 5);
        assert_relative_eq!(durations[0], 0.5);
        assert_relative_eq!(durations[2], 1.0);
        assert_relative_eq!(durations[4], 1.5);
    }

    #[test]
    fn test_note_durations_small() {
        assert!(note_durations(0).is_empty());
        assert_eq!(note_durations(1), vec![0.5]);
        assert_eq!(note_durations(2), vec![0.5, 1.5]);
    }

    #[test_case(PitchMapping::Modulo, 440.0, 56 ; "modulo a4")]
    #[test_case(PitchMapping::Modulo, 261.9, 5 ; "modulo truncates")]
    #[test_case(PitchMapping::Modulo, 100.0, 100 ; "modulo below range")]
    #[test_case(PitchMapping::Nearest, 440.0, 69 ; "nearest a4")]
    #[test_case(PitchMapping::Nearest, 261.63, 60 ; "nearest middle c")]
    #[test_case(PitchMapping::Nearest, 20_000.0, 127 ; "nearest clamps high")]
    fn test_pitch_mapping(mapping: PitchMapping, hz: f32, key: u8) {
        assert_eq!(mapping.to_key(hz), key);
    }

    #[test]
    fn test_notes_are_contiguous() {
        let notes = notes_from_pitches(&[300.0, 310.0, 320.0], PitchMapping::Modulo, None);

        assert_eq!(notes.len(), 3);
        assert_eq!(notes[0].start, 0.0);
        for pair in notes.windows(2) {
            assert_relative_eq!(pair[0].end, pair[1].start);
        }
        assert!(notes.iter().all(|n| n.velocity == NOTE_VELOCITY));
        assert_relative_eq!(clip_duration(&notes), 3.0);
    }

    #[test]
    fn test_max_notes_caps_and_rescales() {
        let pitches = vec![440.0; 50];
        let notes = notes_from_pitches(&pitches, PitchMapping::Nearest, Some(3));

        assert_eq!(notes.len(), 3);
        assert_relative_eq!(notes[2].duration(), MAX_NOTE_SECS);
        assert_relative_eq!(clip_duration(&notes), 3.0);
    }

    #[test]
    fn test_midi_parses_back() {
        let notes = notes_from_pitches(&[440.0, 493.88], PitchMapping::Nearest, None);
        let bytes = write_midi(&notes).unwrap();

        let smf = Smf::parse(&bytes).unwrap();
        assert_eq!(smf.header.format, Format::SingleTrack);
        assert_eq!(smf.header.timing, Timing::Metrical(u15::new(TICKS_PER_BEAT)));
        assert_eq!(smf.tracks.len(), 1);

        let ons: Vec<(u32, u8)> = smf.tracks[0]
            .iter()
            .filter_map(|e| match e.kind {
                TrackEventKind::Midi {
                    message: MidiMessage::NoteOn { key, .. },
                    ..
                } => Some((e.delta.as_int(), key.as_int())),
                _ => None,
            })
            .collect();

        // Second note starts 0.5s (220 ticks) in, right after the first note-off
        assert_eq!(ons, vec![(0, 69), (0, 71)]);

        let total_ticks: u32 = smf.tracks[0].iter().map(|e| e.delta.as_int()).sum();
        assert_eq!(total_ticks, 220 + 660);
    }

    #[test]
    fn test_empty_midi_is_valid() {
        let bytes = write_midi(&[]).unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        assert!(matches!(
            smf.tracks[0].last().unwrap().kind,
            TrackEventKind::Meta(MetaMessage::EndOfTrack)
        ));
    }
}
