//! HTTP Voice Fetcher - 从 TTS 服务拉取音色列表
//!
//! GET {base_url}/api/tts/voices?platform=linux
//! Response: [{"name": "...", "locale": "en-US", "gender": "female", ...}]

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::application::ports::{CatalogError, VoiceFetcherPort};
use crate::domain::voice::{Gender, Platform, VoiceDescriptor};

/// 服务端返回的单个音色
#[derive(Debug, Deserialize)]
struct VoiceDto {
    name: String,
    locale: String,
    #[serde(default)]
    gender: Option<String>,
    #[serde(default)]
    is_neural: bool,
    #[serde(default)]
    display_name: Option<String>,
}

fn parse_gender(raw: Option<&str>) -> Gender {
    match raw.map(|g| g.trim().to_ascii_lowercase()).as_deref() {
        Some("male") | Some("m") => Gender::Male,
        Some("female") | Some("f") => Gender::Female,
        Some("neutral") => Gender::Neutral,
        _ => Gender::Unknown,
    }
}

/// DTO → 领域对象；无效条目跳过
fn into_descriptors(platform: Platform, dtos: Vec<VoiceDto>) -> Vec<VoiceDescriptor> {
    dtos.into_iter()
        .filter_map(|dto| {
            let gender = parse_gender(dto.gender.as_deref());
            match VoiceDescriptor::new(dto.name, dto.locale) {
                Ok(voice) => {
                    let voice = voice.with_gender(gender).with_neural(dto.is_neural);
                    Some(match dto.display_name {
                        Some(display) if !display.trim().is_empty() => {
                            voice.with_display_name(display)
                        }
                        _ => voice,
                    })
                }
                Err(e) => {
                    tracing::warn!(platform = %platform, error = %e, "Skipping invalid voice entry");
                    None
                }
            }
        })
        .collect()
}

/// HTTP 音色拉取配置
#[derive(Debug, Clone)]
pub struct HttpVoiceFetcherConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for HttpVoiceFetcherConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 30,
        }
    }
}

pub struct HttpVoiceFetcher {
    client: Client,
    config: HttpVoiceFetcherConfig,
}

impl HttpVoiceFetcher {
    pub fn new(config: HttpVoiceFetcherConfig) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CatalogError::fetch_failed(Platform::current(), e.to_string()))?;
        Ok(Self { client, config })
    }

    fn voices_url(&self) -> String {
        format!("{}/api/tts/voices", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl VoiceFetcherPort for HttpVoiceFetcher {
    async fn fetch_voices(&self, platform: Platform) -> Result<Vec<VoiceDescriptor>, CatalogError> {
        let response = self
            .client
            .get(self.voices_url())
            .query(&[("platform", platform.as_str())])
            .send()
            .await
            .map_err(|e| CatalogError::fetch_failed(platform, e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CatalogError::UnsupportedPlatform(platform));
        }
        if !status.is_success() {
            return Err(CatalogError::fetch_failed(platform, format!("HTTP {}", status)));
        }

        let dtos: Vec<VoiceDto> = response
            .json()
            .await
            .map_err(|e| CatalogError::fetch_failed(platform, format!("Invalid voice list: {}", e)))?;

        let voices = into_descriptors(platform, dtos);
        tracing::info!(platform = %platform, voices = voices.len(), "Voice list fetched");
        Ok(voices)
    }
}
