//! Tempo estimation
//!
//! Spectral-flux onset envelope, autocorrelation over an eight second lag
//! window, and a log-normal tempo prior centred on 120 BPM.

use super::stft::{magnitude_spectrogram, Spectrogram, HOP_LENGTH, N_FFT};
use crate::engine::AudioBuffer;

/// Center of the tempo prior (BPM)
pub const PRIOR_BPM: f64 = 120.0;

/// Standard deviation of the prior, in octaves
pub const PRIOR_STD_OCTAVES: f64 = 1.0;

/// Fastest tempo reported (BPM)
pub const MAX_TEMPO_BPM: f64 = 320.0;

/// Longest autocorrelation lag (seconds)
pub const MAX_LAG_SECS: f64 = 8.0;

/// Dynamic range of the log spectrogram (dB)
const TOP_DB: f32 = 80.0;

/// Estimate the global tempo of `buffer` in BPM
///
/// Returns 0.0 when the onset envelope carries no energy (silence, a steady
/// tone, or audio shorter than a couple of frames).
pub fn estimate_tempo(buffer: &AudioBuffer) -> f32 {
    let spec = magnitude_spectrogram(&buffer.samples, buffer.sample_rate, N_FFT, HOP_LENGTH);
    let envelope = onset_envelope(&spec);
    tempo_from_envelope(&envelope, spec.sample_rate, spec.hop_length) as f32
}

/// Onset strength per frame
///
/// Mean positive first difference of the dB spectrogram across bins. Frame 0
/// has no predecessor and is 0.
pub fn onset_envelope(spec: &Spectrogram) -> Vec<f32> {
    if spec.frames.is_empty() {
        return Vec::new();
    }

    let db: Vec<Vec<f32>> = spec
        .frames
        .iter()
        .map(|frame| {
            frame
                .iter()
                .map(|&m| 10.0 * (m * m).max(1e-10).log10())
                .collect()
        })
        .collect();

    let peak_db = db
        .iter()
        .flat_map(|frame| frame.iter().copied())
        .fold(f32::NEG_INFINITY, f32::max);
    let floor = peak_db - TOP_DB;

    let mut envelope = Vec::with_capacity(db.len());
    envelope.push(0.0);
    for pair in db.windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);
        let flux: f32 = curr
            .iter()
            .zip(prev)
            .map(|(&c, &p)| (c.max(floor) - p.max(floor)).max(0.0))
            .sum();
        envelope.push(flux / curr.len() as f32);
    }

    envelope
}

/// Pick the best-weighted autocorrelation lag and convert it to BPM
pub fn tempo_from_envelope(envelope: &[f32], sample_rate: u32, hop_length: usize) -> f64 {
    if envelope.len() < 2 {
        return 0.0;
    }

    let frame_rate = sample_rate as f64 / hop_length as f64;
    let max_lag = ((MAX_LAG_SECS * frame_rate).round() as usize).min(envelope.len() - 1);
    let ac = autocorrelate(envelope, max_lag);

    if ac[0] <= 0.0 {
        return 0.0;
    }

    let mut best_bpm = 0.0;
    let mut best_score = 0.0;
    for (lag, &value) in ac.iter().enumerate().skip(1) {
        let bpm = 60.0 * frame_rate / lag as f64;
        if bpm > MAX_TEMPO_BPM {
            continue;
        }
        let score = (value / ac[0]) * tempo_prior(bpm);
        if score > best_score {
            best_score = score;
            best_bpm = bpm;
        }
    }

    best_bpm
}

/// Log-normal weight of `bpm` around the prior center
fn tempo_prior(bpm: f64) -> f64 {
    let octaves = (bpm / PRIOR_BPM).log2() / PRIOR_STD_OCTAVES;
    (-0.5 * octaves * octaves).exp()
}

/// Raw autocorrelation for lags `0..=max_lag`
fn autocorrelate(signal: &[f32], max_lag: usize) -> Vec<f64> {
    (0..=max_lag)
        .map(|lag| {
            signal[lag..]
                .iter()
                .zip(signal)
                .map(|(&a, &b)| a as f64 * b as f64)
                .sum()
        })
        .collect()
}
