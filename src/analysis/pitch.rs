//! Pitch tracking
//!
//! Picks spectral peaks per frame with parabolic interpolation and keeps the
//! highest peak frequency as that frame's pitch.

use super::stft::{magnitude_spectrogram, Spectrogram, HOP_LENGTH, N_FFT};
use crate::engine::AudioBuffer;

/// Lowest frequency considered (Hz)
pub const PITCH_FMIN: f32 = 150.0;

/// Upper bound (exclusive) of the search range (Hz)
pub const PITCH_FMAX: f32 = 4000.0;

/// Peaks below this fraction of the frame maximum are ignored
pub const PEAK_THRESHOLD: f32 = 0.1;

/// Pitch per voiced frame of `buffer`, in Hz
///
/// Frames with no qualifying peak are skipped, so every value is positive.
pub fn track_pitches(buffer: &AudioBuffer) -> Vec<f32> {
    let spec = magnitude_spectrogram(&buffer.samples, buffer.sample_rate, N_FFT, HOP_LENGTH);
    pitch_contour(&spec)
        .into_iter()
        .filter(|&p| p > 0.0)
        .collect()
}

/// Pitch for every frame of `spec`, 0.0 where no peak was found
pub fn pitch_contour(spec: &Spectrogram) -> Vec<f32> {
    spec.frames
        .iter()
        .map(|frame| frame_pitch(frame, spec))
        .collect()
}

fn frame_pitch(frame: &[f32], spec: &Spectrogram) -> f32 {
    let n = frame.len();
    if n < 3 {
        return 0.0;
    }

    let reference = PEAK_THRESHOLD * frame.iter().copied().fold(0.0_f32, f32::max);
    let gated = |i: usize| if frame[i] > reference { frame[i] } else { 0.0 };

    let mut best = 0.0_f32;
    for i in 1..n {
        let freq = spec.bin_frequency(i);
        if freq < PITCH_FMIN {
            continue;
        }
        if freq >= PITCH_FMAX {
            break;
        }

        let here = gated(i);
        // Edge-padded neighbour on the right
        let right = if i + 1 < n { gated(i + 1) } else { here };
        if !(here > gated(i - 1) && here >= right) {
            continue;
        }

        let shift = if i + 1 < n {
            parabolic_shift(frame[i - 1], frame[i], frame[i + 1])
        } else {
            0.0
        };
        let pitch = (i as f32 + shift) * spec.sample_rate as f32 / spec.n_fft as f32;
        best = best.max(pitch);
    }

    best
}

/// Offset of the interpolated peak from the center bin, in bins
fn parabolic_shift(left: f32, center: f32, right: f32) -> f32 {
    let avg = 0.5 * (right - left);
    let curvature = 2.0 * center - right - left;
    let denom = if curvature.abs() < f32::MIN_POSITIVE {
        curvature + 1.0
    } else {
        curvature
    };
    avg / denom
}

/// Mean of the pitch list, 0.0 when empty
pub fn average_pitch(pitches: &[f32]) -> f32 {
    if pitches.is_empty() {
        return 0.0;
    }
    (pitches.iter().map(|&p| p as f64).sum::<f64>() / pitches.len() as f64) as f32
}
