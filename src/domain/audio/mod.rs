//! Audio Context - 音频容器
//!
//! 职责:
//! - 容器格式定义与扩展名映射
//! - 签名探测 / WAV 头解析 / PCM 包装
//! - 输出文件命名

mod errors;
mod format;
mod inspector;
mod naming;

pub use errors::FormatError;
pub use format::AudioFormat;
pub use inspector::{
    detect_format, parse_wav, validate_format, wrap_i16_samples, wrap_pcm_as_wav, WavInfo,
    WAV_HEADER_LEN,
};
pub use naming::{chunk_file_name, suggest_file_name};
