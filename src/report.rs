//! Run report
//!
//! JSON summary of one generation run, written next to the generated files.
//! It also carries the full pitch contour for external plotting.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::composer::Mood;
use crate::error::Result;

/// A file produced by the run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputFile {
    pub path: PathBuf,
    pub bytes: u64,
    /// Hex-encoded SHA-256 of the file contents
    pub sha256: String,
}

impl OutputFile {
    /// Describe `contents` written at `path`
    pub fn describe(path: &Path, contents: &[u8]) -> Self {
        Self {
            path: path.to_path_buf(),
            bytes: contents.len() as u64,
            sha256: sha256_hex(contents),
        }
    }

    /// Read `path` back and describe it
    pub fn from_disk(path: &Path) -> Result<Self> {
        let contents = std::fs::read(path)?;
        Ok(Self::describe(path, &contents))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub input: PathBuf,
    pub raga: String,
    pub mood: Mood,
    pub tempo_bpm: f32,
    pub average_pitch_hz: f32,
    pub note_count: usize,
    pub clip_duration_secs: f64,
    pub synth_backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synth_fallback_reason: Option<String>,
    pub composer_model: String,
    pub suggestion: String,
    pub pitch_contour: Vec<f32>,
    pub outputs: Vec<OutputFile>,
}

impl RunReport {
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

pub fn sha256_hex(contents: &[u8]) -> String {
    format!("{:x}", Sha256::digest(contents))
}
