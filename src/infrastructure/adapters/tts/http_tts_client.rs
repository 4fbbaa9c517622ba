//! HTTP TTS Client - 调用外部 TTS HTTP 服务
//!
//! 实现 TtsEnginePort trait，通过 HTTP 调用外部 TTS 服务
//!
//! 外部 TTS API:
//! POST {base_url}/api/tts/synthesize
//! Request: {"text": "...", "voice": "...", "rate": 1.0, ...}  (JSON)
//! Response: 音频二进制，容器与请求的 format 一致

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;

use crate::application::ports::{EngineInfo, SynthesisRequest, TtsEnginePort, TtsError};
use crate::domain::audio::{validate_format, AudioFormat, FormatError};
use crate::domain::voice::Platform;

/// TTS 合成请求体 (JSON)
#[derive(Debug, Serialize)]
struct TtsHttpRequest<'a> {
    text: &'a str,
    voice: &'a str,
    rate: f32,
    pitch: f32,
    volume: f32,
    format: AudioFormat,
    /// text 是否为 SSML
    markup: bool,
    platform: Platform,
}

/// HTTP TTS 客户端配置
#[derive(Debug, Clone)]
pub struct HttpTtsClientConfig {
    /// TTS 服务基础 URL
    pub base_url: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    /// 网络错误 / 超时的重试次数
    pub max_retries: u32,
}

impl Default for HttpTtsClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 120,
            max_retries: 0,
        }
    }
}

impl HttpTtsClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }
}

/// HTTP TTS 客户端
pub struct HttpTtsClient {
    client: Client,
    config: HttpTtsClientConfig,
}

impl HttpTtsClient {
    /// 创建新的 HTTP TTS 客户端
    pub fn new(config: HttpTtsClientConfig) -> Result<Self, TtsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TtsError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// 使用默认配置创建客户端
    pub fn with_default_config() -> Result<Self, TtsError> {
        Self::new(HttpTtsClientConfig::default())
    }

    fn synthesize_url(&self) -> String {
        format!("{}/api/tts/synthesize", self.config.base_url.trim_end_matches('/'))
    }

    fn health_url(&self) -> String {
        format!("{}/health", self.config.base_url.trim_end_matches('/'))
    }

    async fn send_once(&self, request: &SynthesisRequest) -> Result<Vec<u8>, TtsError> {
        let body = TtsHttpRequest {
            text: &request.text,
            voice: &request.params.voice,
            rate: request.params.rate,
            pitch: request.params.pitch,
            volume: request.params.volume,
            format: request.params.format,
            markup: request.params.markup,
            platform: request.platform,
        };

        let response = self
            .client
            .post(self.synthesize_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TtsError::Timeout
                } else if e.is_connect() {
                    TtsError::NetworkError(format!("Cannot connect to TTS service: {}", e))
                } else {
                    TtsError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(TtsError::VoiceNotFound(request.params.voice.clone()));
        }
        if status == StatusCode::UNSUPPORTED_MEDIA_TYPE {
            return Err(TtsError::UnsupportedFormat(request.params.format));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TtsError::ServiceError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| TtsError::InvalidResponse(format!("Failed to read audio: {}", e)))?
            .to_vec();

        // 返回的容器必须与请求一致，否则缓存里会混入错误格式
        validate_format(&audio, request.params.format).map_err(|e| match e {
            FormatError::UnknownFormat => {
                TtsError::InvalidResponse("Response is not a recognised audio container".to_string())
            }
            other => TtsError::InvalidResponse(other.to_string()),
        })?;

        Ok(audio)
    }
}

fn is_retryable(err: &TtsError) -> bool {
    matches!(err, TtsError::Timeout | TtsError::NetworkError(_))
}

#[async_trait]
impl TtsEnginePort for HttpTtsClient {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<Vec<u8>, TtsError> {
        tracing::debug!(
            url = %self.synthesize_url(),
            text_len = request.text.len(),
            voice = %request.params.voice,
            format = %request.params.format,
            "Sending TTS synthesize request"
        );

        let mut attempt = 0;
        loop {
            match self.send_once(&request).await {
                Ok(audio) => {
                    tracing::info!(
                        voice = %request.params.voice,
                        audio_size = audio.len(),
                        attempts = attempt + 1,
                        "TTS synthesis completed"
                    );
                    return Ok(audio);
                }
                Err(e) if is_retryable(&e) && attempt < self.config.max_retries => {
                    attempt += 1;
                    tracing::warn!(error = %e, attempt = attempt, "TTS request failed, retrying");
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(self.health_url())
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    fn info(&self) -> EngineInfo {
        EngineInfo {
            name: "http".to_string(),
            endpoint: Some(self.synthesize_url()),
            formats: AudioFormat::DETECTION_ORDER.to_vec(),
            supports_markup: true,
        }
    }
}
