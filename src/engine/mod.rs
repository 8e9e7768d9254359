//! Audio Engine Module
//!
//! - Mono audio buffer
//! - WAV file I/O

pub mod buffer;
pub mod io;

pub use buffer::{AudioBuffer, ANALYSIS_SAMPLE_RATE};
pub use io::{generate_test_tone, load_audio, write_wav};
