//! TTS Engine Port - 合成引擎抽象
//!
//! 定义合成的抽象接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::domain::audio::AudioFormat;
use crate::domain::synthesis::SynthesisParams;
use crate::domain::voice::Platform;

/// TTS 错误
#[derive(Debug, Error)]
pub enum TtsError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Voice not found: {0}")]
    VoiceNotFound(String),

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(AudioFormat),
}

/// 合成请求
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    /// 预处理后的文本（或清理后的 SSML）
    pub text: String,
    pub params: SynthesisParams,
    pub platform: Platform,
}

/// 引擎诊断信息
#[derive(Debug, Clone, Serialize)]
pub struct EngineInfo {
    pub name: String,
    pub endpoint: Option<String>,
    pub formats: Vec<AudioFormat>,
    pub supports_markup: bool,
}

/// TTS Engine Port
#[async_trait]
pub trait TtsEnginePort: Send + Sync {
    /// 合成一段文本，返回 `params.format` 对应容器的完整音频
    async fn synthesize(&self, request: SynthesisRequest) -> Result<Vec<u8>, TtsError>;

    /// 检查引擎是否可用
    async fn health_check(&self) -> bool {
        true
    }

    fn info(&self) -> EngineInfo;
}
