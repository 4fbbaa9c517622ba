//! Fake TTS Client - 用于测试和 dry-run 的 TTS 客户端
//!
//! 不调用任何服务，按文本长度生成静音 WAV

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::application::ports::{EngineInfo, SynthesisRequest, TtsEnginePort, TtsError};
use crate::domain::audio::{wrap_i16_samples, AudioFormat};

/// Fake TTS Client 配置
#[derive(Debug, Clone)]
pub struct FakeTtsClientConfig {
    /// 每个字符对应的时长（毫秒）
    pub ms_per_char: u64,
    /// 最短时长（毫秒）
    pub min_duration_ms: u64,
    /// 采样率
    pub sample_rate: u32,
    /// 模拟推理延迟（毫秒）
    pub latency_ms: u64,
}

impl Default for FakeTtsClientConfig {
    fn default() -> Self {
        Self {
            ms_per_char: 60,
            min_duration_ms: 200,
            sample_rate: 16000,
            latency_ms: 0,
        }
    }
}

/// Fake TTS Client
pub struct FakeTtsClient {
    config: FakeTtsClientConfig,
    calls: AtomicU64,
    failing: AtomicBool,
}

impl FakeTtsClient {
    pub fn new(config: FakeTtsClientConfig) -> Self {
        tracing::info!(
            sample_rate = config.sample_rate,
            latency_ms = config.latency_ms,
            "FakeTtsClient initialized"
        );
        Self {
            config,
            calls: AtomicU64::new(0),
            failing: AtomicBool::new(false),
        }
    }

    /// 使用默认配置创建
    pub fn with_defaults() -> Self {
        Self::new(FakeTtsClientConfig::default())
    }

    /// 已执行的合成次数
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    /// 让后续请求返回服务错误
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn duration_ms(&self, text: &str) -> u64 {
        (text.chars().count() as u64 * self.config.ms_per_char).max(self.config.min_duration_ms)
    }
}

#[async_trait]
impl TtsEnginePort for FakeTtsClient {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<Vec<u8>, TtsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.failing.load(Ordering::SeqCst) {
            return Err(TtsError::ServiceError("fake engine set to fail".to_string()));
        }
        if request.params.format != AudioFormat::Wav {
            return Err(TtsError::UnsupportedFormat(request.params.format));
        }

        if self.config.latency_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.config.latency_ms)).await;
        }

        let duration_ms = self.duration_ms(&request.text);
        let samples = vec![0i16; (self.config.sample_rate as u64 * duration_ms / 1000) as usize];
        let audio = wrap_i16_samples(&samples, self.config.sample_rate, 1)
            .map_err(|e| TtsError::InvalidResponse(e.to_string()))?;

        tracing::debug!(
            text_len = request.text.len(),
            voice = %request.params.voice,
            duration_ms = duration_ms,
            "FakeTtsClient: returning silent audio"
        );
        Ok(audio)
    }

    fn info(&self) -> EngineInfo {
        EngineInfo {
            name: "fake".to_string(),
            endpoint: None,
            formats: vec![AudioFormat::Wav],
            supports_markup: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::audio::parse_wav;
    use crate::domain::synthesis::SynthesisParams;
    use crate::domain::voice::Platform;

    fn request(text: &str, format: AudioFormat) -> SynthesisRequest {
        SynthesisRequest {
            text: text.to_string(),
            params: SynthesisParams::new("en-US").with_format(format),
            platform: Platform::Linux,
        }
    }

    #[tokio::test]
    async fn test_returns_silent_wav_sized_by_text() {
        let client = FakeTtsClient::with_defaults();
        let audio = client
            .synthesize(request("ten chars!", AudioFormat::Wav))
            .await
            .unwrap();

        let info = parse_wav(&audio).unwrap();
        assert_eq!(info.sample_rate, 16000);
        assert_eq!(info.duration_ms, 600);
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_rejects_other_formats_and_failure_toggle() {
        let client = FakeTtsClient::with_defaults();
        assert!(matches!(
            client.synthesize(request("hi", AudioFormat::Mp3)).await,
            Err(TtsError::UnsupportedFormat(AudioFormat::Mp3))
        ));

        client.set_failing(true);
        assert!(matches!(
            client.synthesize(request("hi", AudioFormat::Wav)).await,
            Err(TtsError::ServiceError(_))
        ));
        assert_eq!(client.calls(), 2);
    }
}
