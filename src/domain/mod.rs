//! Domain Layer - 领域层
//!
//! 限界上下文:
//! - Audio Context: 音频格式识别与 WAV 处理
//! - Markup Context: SSML 校验
//! - Synthesis Context: 合成参数与缓存键
//! - Text Context: 文本预处理
//! - Voice Context: 音色与平台

pub mod audio;
pub mod markup;
pub mod synthesis;
pub mod text;
pub mod voice;
