//! Voice Context - 音色目录限界上下文
//!
//! 职责:
//! - 平台标识
//! - 音色描述
//! - 按平台分桶的目录快照

mod aggregate;
mod errors;
mod value_objects;

pub use aggregate::VoicePlatformBucket;
pub use errors::VoiceError;
pub use value_objects::{Gender, Platform, VoiceDescriptor};
