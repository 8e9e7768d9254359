//! Raga BGM - background music sketches from Indian classical recordings
//!
//! One linear pipeline per run:
//! 1. Load a WAV recording and extract tempo and a pitch contour
//! 2. Ask a language model for composition ideas for a chosen raga and mood
//! 3. Turn the pitch contour into a MIDI line and render it to WAV
//!
//! # Modules
//!
//! - `engine`: mono audio buffer and WAV I/O
//! - `analysis`: tempo estimation and pitch tracking
//! - `composer`: suggestion backends (Gemini, mock)
//! - `synth`: note generation, MIDI encoding, SoundFont/sine rendering
//! - `pipeline`: the end-to-end run and its outputs

pub mod analysis;
pub mod cli;
pub mod composer;
pub mod config;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod synth;

pub use error::{BgmError, Result};
