//! CLI Module
//!
//! Command-line interface for raga-bgm.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::composer::{Mood, DEFAULT_RAGA};
use crate::config::ComposerKind;
use crate::synth::PitchMapping;

/// Raga BGM - background music sketches from Indian classical recordings
#[derive(Parser, Debug)]
#[command(name = "raga-bgm")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print tempo and average pitch of a recording
    #[command(name = "analyze")]
    Analyze {
        /// Input WAV file
        input: PathBuf,

        /// Print the full feature set as JSON
        #[arg(long)]
        json: bool,
    },

    /// Analyze a recording, ask for composition ideas and render a new clip
    #[command(name = "generate")]
    Generate {
        /// Input WAV file
        input: PathBuf,

        /// Raga to base the composition on
        #[arg(short, long, default_value = DEFAULT_RAGA)]
        raga: String,

        /// Mood of the new piece
        #[arg(short, long, value_enum, default_value_t = MoodArg::Peaceful)]
        mood: MoodArg,

        /// Directory for the generated files
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Suggestion backend
        #[arg(long, value_enum)]
        composer: Option<ComposerArg>,

        /// SoundFont used to render the clip
        #[arg(long)]
        soundfont: Option<PathBuf>,

        /// How detected frequencies become MIDI keys
        #[arg(long, value_enum)]
        pitch_mapping: Option<PitchMappingArg>,

        /// Use at most this many detected pitches
        #[arg(long)]
        max_notes: Option<usize>,
    },

    /// List the available moods
    #[command(name = "moods")]
    Moods,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MoodArg {
    Peaceful,
    Energetic,
    Sad,
    Meditative,
    Joyful,
}

impl From<MoodArg> for Mood {
    fn from(arg: MoodArg) -> Self {
        match arg {
            MoodArg::Peaceful => Mood::Peaceful,
            MoodArg::Energetic => Mood::Energetic,
            MoodArg::Sad => Mood::Sad,
            MoodArg::Meditative => Mood::Meditative,
            MoodArg::Joyful => Mood::Joyful,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ComposerArg {
    Gemini,
    Mock,
}

impl From<ComposerArg> for ComposerKind {
    fn from(arg: ComposerArg) -> Self {
        match arg {
            ComposerArg::Gemini => ComposerKind::Gemini,
            ComposerArg::Mock => ComposerKind::Mock,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PitchMappingArg {
    Modulo,
    Nearest,
}

impl From<PitchMappingArg> for PitchMapping {
    fn from(arg: PitchMappingArg) -> Self {
        match arg {
            PitchMappingArg::Modulo => PitchMapping::Modulo,
            PitchMappingArg::Nearest => PitchMapping::Nearest,
        }
    }
}
