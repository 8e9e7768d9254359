//! Audio file I/O for raga-bgm
//!
//! Reads WAV recordings into mono float buffers at the analysis rate, and
//! writes synthesized clips back out as WAV.
//!
//! Sample rate conversion uses linear interpolation.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use tracing::debug;

use crate::engine::buffer::AudioBuffer;
use crate::error::{BgmError, Result};

/// Load a WAV file as mono audio at `target_rate`
///
/// All channels are averaged into one. The result is resampled when the file's
/// rate differs from `target_rate`.
///
/// # Errors
/// * `FileNotFound` - If the file does not exist
/// * `InvalidAudio` - If the file is not a valid WAV file
/// * `UnsupportedFormat` - If the bit depth cannot be decoded
/// * `EmptyAudio` - If the file holds no samples
pub fn load_audio(path: &Path, target_rate: u32) -> Result<AudioBuffer> {
    if !path.exists() {
        return Err(BgmError::FileNotFound {
            path: path.display().to_string(),
            source: None,
        });
    }

    let reader = WavReader::open(path).map_err(wav_open_error)?;

    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return Err(BgmError::InvalidAudio {
            reason: "WAV header declares a sample rate of 0 Hz".to_string(),
            source: None,
        });
    }
    let channels = spec.channels.max(1) as usize;
    debug!(
        path = %path.display(),
        sample_rate = spec.sample_rate,
        channels,
        bits = spec.bits_per_sample,
        "Decoding WAV"
    );

    let interleaved = read_samples_as_f32(reader, spec.bits_per_sample, spec.sample_format)?;
    if interleaved.is_empty() {
        return Err(BgmError::EmptyAudio);
    }

    let mono = downmix(&interleaved, channels);
    let samples = if spec.sample_rate != target_rate {
        resample_linear(&mono, target_rate as f64 / spec.sample_rate as f64)
    } else {
        mono
    };

    Ok(AudioBuffer::from_samples(samples, target_rate))
}

/// Write a mono buffer to a WAV file
///
/// `bit_depth` selects 16/24-bit integer PCM or 32-bit float.
pub fn write_wav(buffer: &AudioBuffer, path: &Path, bit_depth: u16) -> Result<()> {
    if !matches!(bit_depth, 16 | 24 | 32) {
        return Err(BgmError::UnsupportedFormat {
            format: format!("{}-bit audio (only 16, 24, 32 supported)", bit_depth),
        });
    }

    let spec = WavSpec {
        channels: 1,
        sample_rate: buffer.sample_rate,
        bits_per_sample: bit_depth,
        sample_format: if bit_depth == 32 {
            SampleFormat::Float
        } else {
            SampleFormat::Int
        },
    };

    let mut writer = WavWriter::create(path, spec).map_err(wav_write_error)?;

    match bit_depth {
        16 => {
            for &sample in &buffer.samples {
                let scaled = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
                writer.write_sample(scaled).map_err(wav_write_error)?;
            }
        }
        24 => {
            for &sample in &buffer.samples {
                // 24-bit stored as i32 in hound
                let scaled = (sample * 8388607.0).clamp(-8388608.0, 8388607.0) as i32;
                writer.write_sample(scaled).map_err(wav_write_error)?;
            }
        }
        _ => {
            for &sample in &buffer.samples {
                writer.write_sample(sample).map_err(wav_write_error)?;
            }
        }
    }

    writer.finalize().map_err(wav_write_error)?;
    Ok(())
}

/// Generate a test tone (sine wave)
///
/// Creates a mono buffer containing a sine wave at the specified frequency.
pub fn generate_test_tone(frequency: f32, duration_secs: f32, sample_rate: u32) -> AudioBuffer {
    let num_samples = (duration_secs * sample_rate as f32) as usize;
    let angular_freq = 2.0 * std::f32::consts::PI * frequency / sample_rate as f32;

    let samples = (0..num_samples)
        .map(|i| (angular_freq * i as f32).sin())
        .collect();

    AudioBuffer::from_samples(samples, sample_rate)
}

// ============================================================================
// Internal helper functions
// ============================================================================

fn wav_open_error(e: hound::Error) -> BgmError {
    match e {
        hound::Error::Unsupported => BgmError::UnsupportedFormat {
            format: "WAV sample encoding (only 8/16/24/32-bit int and 32-bit float)".to_string(),
        },
        other => BgmError::InvalidAudio {
            reason: format!("Failed to open WAV file: {}", other),
            source: Some(Box::new(other)),
        },
    }
}

fn wav_write_error(e: hound::Error) -> BgmError {
    match e {
        hound::Error::IoError(io) => BgmError::Io(io),
        other => BgmError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            other.to_string(),
        )),
    }
}

/// Read samples from WAV reader and convert to f32
fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> Result<Vec<f32>> {
    fn collect<T, R: std::io::Read>(
        reader: &mut WavReader<R>,
        scale: f32,
        label: &str,
    ) -> Result<Vec<f32>>
    where
        T: hound::Sample + Into<f64>,
    {
        reader
            .samples::<T>()
            .map(|s| s.map(|v| (v.into() / scale as f64) as f32))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(|e| BgmError::InvalidAudio {
                reason: format!("Failed to read {} samples: {}", label, e),
                source: Some(Box::new(e)),
            })
    }

    match sample_format {
        SampleFormat::Float => collect::<f32, R>(&mut reader, 1.0, "float"),
        SampleFormat::Int => match bits_per_sample {
            8 => collect::<i8, R>(&mut reader, 128.0, "8-bit"),
            16 => collect::<i16, R>(&mut reader, 32768.0, "16-bit"),
            // 24-bit stored as i32 in hound
            24 => collect::<i32, R>(&mut reader, 8388608.0, "24-bit"),
            32 => collect::<i32, R>(&mut reader, 2147483648.0, "32-bit int"),
            _ => Err(BgmError::UnsupportedFormat {
                format: format!("{}-bit integer audio", bits_per_sample),
            }),
        },
    }
}

/// Average interleaved frames [L,R,L,R,...] into a single channel
fn downmix(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels == 1 {
        return samples.to_vec();
    }

    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Linear interpolation resampling
fn resample_linear(samples: &[f32], ratio: f64) -> Vec<f32> {
    if samples.is_empty() {
        return Vec::new();
    }

    let source_len = samples.len();
    let target_len = ((source_len as f64) * ratio).ceil() as usize;
    let mut output = Vec::with_capacity(target_len);

    for i in 0..target_len {
        // Map output index to source position
        let src_pos = i as f64 / ratio;
        let src_idx = src_pos.floor() as usize;
        let frac = (src_pos - src_idx as f64) as f32;

        let sample = if src_idx + 1 < source_len {
            samples[src_idx] * (1.0 - frac) + samples[src_idx + 1] * frac
        } else if src_idx < source_len {
            samples[src_idx]
        } else {
            0.0
        };

        output.push(sample);
    }

    output
}

// ============================================================================
// Tests
// ============================================================================
