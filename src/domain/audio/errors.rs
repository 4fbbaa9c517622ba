//! Audio Context - Errors

use thiserror::Error;

use super::AudioFormat;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Unknown audio container")]
    UnknownFormat,

    #[error("Format mismatch: expected {expected}, detected {detected}")]
    Mismatch {
        expected: AudioFormat,
        detected: AudioFormat,
    },

    #[error("Invalid WAV: {0}")]
    InvalidWav(String),

    #[error("Probe failed: {0}")]
    ProbeFailed(String),
}
