//! Error handling for raga-bgm
//!
//! Every error carries a stable code and, where it helps, recovery suggestions
//! the CLI prints under the message.

use thiserror::Error;

/// Result type alias for raga-bgm operations
pub type Result<T> = std::result::Result<T, BgmError>;

/// Main error type for raga-bgm operations
#[derive(Error, Debug)]
pub enum BgmError {
    // File Errors
    #[error("File not found: {path}")]
    FileNotFound {
        path: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Invalid audio file: {reason}")]
    InvalidAudio {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    // Audio Validation Errors
    #[error("Audio too short: {duration_secs:.3}s (minimum 0.1s)")]
    AudioTooShort { duration_secs: f64 },

    #[error("Audio contains no samples")]
    EmptyAudio,

    // Composer Errors
    #[error("Invalid parameter '{param}': got {value}, expected {expected}")]
    InvalidParameter {
        param: String,
        value: String,
        expected: String,
    },

    #[error("No API key configured for {model}")]
    MissingApiKey { model: String },

    #[error("Composer unavailable: {reason}")]
    ComposerUnavailable { reason: String },

    #[error("Composer request timed out after {timeout_ms}ms")]
    ComposerTimeout { timeout_ms: u64 },

    #[error("Composer error: {reason}")]
    ComposerError { reason: String },

    // Synthesis Errors
    #[error("MIDI encoding failed: {reason}")]
    MidiError { reason: String },

    #[error("Synthesis failed ({backend}): {reason}")]
    SynthesisError { backend: String, reason: String },

    // Configuration Errors
    #[error("Invalid configuration: {reason}")]
    ConfigError { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BgmError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            BgmError::FileNotFound { .. } => "FILE_NOT_FOUND",
            BgmError::InvalidAudio { .. } => "INVALID_AUDIO",
            BgmError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            BgmError::AudioTooShort { .. } => "AUDIO_TOO_SHORT",
            BgmError::EmptyAudio => "EMPTY_AUDIO",
            BgmError::InvalidParameter { .. } => "INVALID_PARAMETER",
            BgmError::MissingApiKey { .. } => "MISSING_API_KEY",
            BgmError::ComposerUnavailable { .. } => "COMPOSER_UNAVAILABLE",
            BgmError::ComposerTimeout { .. } => "COMPOSER_TIMEOUT",
            BgmError::ComposerError { .. } => "COMPOSER_ERROR",
            BgmError::MidiError { .. } => "MIDI_ERROR",
            BgmError::SynthesisError { .. } => "SYNTHESIS_ERROR",
            BgmError::ConfigError { .. } => "CONFIG_ERROR",
            BgmError::Io(_) => "IO_ERROR",
            BgmError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if this error is recoverable by changing input or settings
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            BgmError::FileNotFound { .. }
                | BgmError::InvalidAudio { .. }
                | BgmError::UnsupportedFormat { .. }
                | BgmError::InvalidParameter { .. }
                | BgmError::MissingApiKey { .. }
                | BgmError::ComposerUnavailable { .. }
                | BgmError::ComposerTimeout { .. }
                | BgmError::SynthesisError { .. }
                | BgmError::ConfigError { .. }
        )
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            BgmError::FileNotFound { .. } => vec![
                "Check the file path is correct",
                "Verify the file hasn't been moved or deleted",
            ],
            BgmError::InvalidAudio { .. } => vec![
                "Only WAV input is supported",
                "Check if the file plays in another application",
                "The file may be corrupted - try re-exporting from source",
            ],
            BgmError::UnsupportedFormat { .. } => vec![
                "Convert to 16-bit or 24-bit PCM WAV",
                "Supported bit depths: 8, 16, 24, 32 (int) and 32 (float)",
            ],
            BgmError::AudioTooShort { .. } | BgmError::EmptyAudio => vec![
                "Use a recording of at least a few seconds",
                "Tempo estimation needs several beats of audio",
            ],
            BgmError::MissingApiKey { .. } => vec![
                "Set the GEMINI_API_KEY environment variable",
                "Or add composer.api_key to the config file",
                "Use '--composer mock' to run without the cloud model",
            ],
            BgmError::ComposerUnavailable { .. } | BgmError::ComposerTimeout { .. } => vec![
                "Check your network connection",
                "Increase RAGA_BGM_TIMEOUT_MS for slow responses",
                "Use '--composer mock' to run without the cloud model",
            ],
            BgmError::SynthesisError { .. } => vec![
                "Check the SoundFont path",
                "Omit '--soundfont' to use the built-in sine synthesizer",
            ],
            BgmError::ConfigError { .. } => vec![
                "Check the config file is valid JSON",
                "Remove unknown keys from the config file",
            ],
            _ => vec![],
        }
    }

    /// Get a user-friendly message for this error
    pub fn friendly_message(&self) -> String {
        match self {
            BgmError::FileNotFound { path, .. } => {
                format!("I couldn't find the recording at '{}'.", path)
            }
            BgmError::InvalidAudio { reason, .. } => {
                format!("This file doesn't appear to be a valid WAV recording: {}", reason)
            }
            BgmError::MissingApiKey { model } => {
                format!(
                    "No API key is configured for '{}', so I can't ask it for composition ideas.",
                    model
                )
            }
            BgmError::ComposerTimeout { timeout_ms } => {
                format!(
                    "The language model didn't answer within {:.0} seconds.",
                    *timeout_ms as f64 / 1000.0
                )
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = BgmError::FileNotFound {
            path: "raga.wav".to_string(),
            source: None,
        };
        assert_eq!(err.error_code(), "FILE_NOT_FOUND");
        assert_eq!(BgmError::EmptyAudio.error_code(), "EMPTY_AUDIO");
    }

    #[test]
    fn test_recovery_suggestions() {
        let err = BgmError::MissingApiKey {
            model: "gemini".to_string(),
        };
        assert!(err.is_recoverable());
        assert!(err
            .recovery_suggestions()
            .iter()
            .any(|s| s.contains("GEMINI_API_KEY")));
    }

    #[test]
    fn test_midi_error_not_recoverable() {
        let err = BgmError::MidiError {
            reason: "write failed".to_string(),
        };
        assert!(!err.is_recoverable());
        assert!(err.recovery_suggestions().is_empty());
    }

    #[test]
    fn test_friendly_timeout_message() {
        let err = BgmError::ComposerTimeout { timeout_ms: 30_000 };
        assert!(err.friendly_message().contains("30 seconds"));
    }
}
