//! Audio Buffer
//!
//! Mono 32-bit float audio at a known sample rate. Analysis and synthesis
//! both work on this type.

use crate::error::{BgmError, Result};

// ============================================================================
// Constants
// ============================================================================

/// Sample rate recordings are resampled to before analysis (22.05kHz)
pub const ANALYSIS_SAMPLE_RATE: u32 = 22050;

/// Minimum audio duration in seconds (100ms)
pub const MIN_DURATION_SECS: f64 = 0.1;

/// Mono audio buffer
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Samples in the range [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Create a silent buffer of `num_samples` samples
    pub fn new(num_samples: usize, sample_rate: u32) -> Self {
        Self {
            samples: vec![0.0; num_samples],
            sample_rate,
        }
    }

    /// Wrap existing samples
    pub fn from_samples(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn num_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Absolute peak sample value
    pub fn peak(&self) -> f32 {
        self.samples.iter().map(|s| s.abs()).fold(0.0_f32, f32::max)
    }

    /// Scale so the absolute peak is 1.0. Silent buffers are left untouched.
    pub fn normalize(&mut self) {
        let peak = self.peak();
        if peak > 0.0 {
            for sample in &mut self.samples {
                *sample /= peak;
            }
        }
    }

    /// Reject buffers that are too small to analyze
    pub fn validate_for_analysis(&self) -> Result<()> {
        if self.is_empty() {
            return Err(BgmError::EmptyAudio);
        }
        let duration_secs = self.duration_secs();
        if duration_secs < MIN_DURATION_SECS {
            return Err(BgmError::AudioTooShort { duration_secs });
        }
        Ok(())
    }
}
