//! Text Context - Errors

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TextError {
    #[error("Text is empty after normalization")]
    Empty,

    #[error("Text length {length} exceeds platform limit {limit}")]
    LengthExceeded { length: usize, limit: usize },
}
