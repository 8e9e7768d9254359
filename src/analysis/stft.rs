//! Short-time Fourier transform
//!
//! Centered frames, periodic Hann window, magnitude output.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// FFT size used by both tempo and pitch analysis
pub const N_FFT: usize = 2048;

/// Hop between successive frames
pub const HOP_LENGTH: usize = 512;

/// Magnitude spectrogram, stored frame-major
#[derive(Debug, Clone)]
pub struct Spectrogram {
    /// `frames[t][k]` is the magnitude of bin `k` in frame `t`
    pub frames: Vec<Vec<f32>>,
    pub n_fft: usize,
    pub hop_length: usize,
    pub sample_rate: u32,
}

impl Spectrogram {
    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    /// Number of frequency bins per frame (`n_fft / 2 + 1`)
    pub fn num_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    /// Center frequency of bin `k` in Hz
    pub fn bin_frequency(&self, k: usize) -> f32 {
        k as f32 * self.sample_rate as f32 / self.n_fft as f32
    }
}

/// Periodic Hann window of length `n`
pub fn hann_window(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| {
            let phase = 2.0 * std::f32::consts::PI * i as f32 / n as f32;
            0.5 - 0.5 * phase.cos()
        })
        .collect()
}

/// Compute the magnitude spectrogram of `samples`
///
/// The signal is zero-padded by `n_fft / 2` on both sides so frame `t` is
/// centered on sample `t * hop_length`.
pub fn magnitude_spectrogram(
    samples: &[f32],
    sample_rate: u32,
    n_fft: usize,
    hop_length: usize,
) -> Spectrogram {
    let pad = n_fft / 2;
    let mut padded = vec![0.0_f32; samples.len() + 2 * pad];
    padded[pad..pad + samples.len()].copy_from_slice(samples);

    let num_frames = if padded.len() >= n_fft {
        1 + (padded.len() - n_fft) / hop_length
    } else {
        0
    };

    let window = hann_window(n_fft);
    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(n_fft);
    let num_bins = n_fft / 2 + 1;

    let mut frames = Vec::with_capacity(num_frames);
    let mut scratch = vec![Complex::new(0.0, 0.0); n_fft];

    for t in 0..num_frames {
        let start = t * hop_length;
        for (i, slot) in scratch.iter_mut().enumerate() {
            *slot = Complex::new(padded[start + i] * window[i], 0.0);
        }
        fft.process(&mut scratch);
        frames.push(scratch[..num_bins].iter().map(|c| c.norm()).collect());
    }

    Spectrogram {
        frames,
        n_fft,
        hop_length,
        sample_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::generate_test_tone;
    use approx::assert_relative_eq;

    #[test]
    fn test_hann_window_shape() {
        let window = hann_window(8);
        assert_relative_eq!(window[0], 0.0);
        assert_relative_eq!(window[4], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_frame_count_centered() {
        let samples = vec![0.0; 22050];
        let spec = magnitude_spectrogram(&samples, 22050, N_FFT, HOP_LENGTH);
        assert_eq!(spec.num_frames(), 1 + 22050 / HOP_LENGTH);
        assert_eq!(spec.frames[0].len(), spec.num_bins());
    }

    #[test]
    fn test_peak_bin_matches_tone() {
        let tone = generate_test_tone(1000.0, 0.5, 22050);
        let spec = magnitude_spectrogram(&tone.samples, 22050, N_FFT, HOP_LENGTH);

        let frame = &spec.frames[spec.num_frames() / 2];
        let (peak_bin, _) = frame
            .iter()
            .enumerate()
            .fold((0, 0.0_f32), |best, (k, &m)| if m > best.1 { (k, m) } else { best });

        assert!((spec.bin_frequency(peak_bin) - 1000.0).abs() < spec.bin_frequency(1));
    }
}
