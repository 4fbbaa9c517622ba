//! Voice Context - Errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),

    #[error("Invalid voice descriptor: {0}")]
    InvalidDescriptor(String),
}
