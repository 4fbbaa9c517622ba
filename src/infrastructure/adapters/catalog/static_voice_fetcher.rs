//! Static Voice Fetcher - 固定的音色列表
//!
//! 用于测试和离线运行

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::application::ports::{CatalogError, VoiceFetcherPort};
use crate::domain::voice::{Gender, Platform, VoiceDescriptor};

#[derive(Default)]
pub struct StaticVoiceFetcher {
    voices: HashMap<Platform, Vec<VoiceDescriptor>>,
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl StaticVoiceFetcher {
    /// 空列表；未配置的平台返回 `UnsupportedPlatform`
    pub fn new() -> Self {
        Self::default()
    }

    /// 内置的小型目录，每个平台两种语言
    pub fn builtin() -> Self {
        let mut fetcher = Self::new();
        for platform in Platform::ALL {
            let voices = [
                ("en-US", Gender::Female, "English (US)"),
                ("zh-CN", Gender::Male, "Chinese (Mandarin)"),
            ]
            .into_iter()
            .filter_map(|(locale, gender, display)| {
                VoiceDescriptor::new(format!("{}-{}", platform, locale), locale)
                    .ok()
                    .map(|v| v.with_gender(gender).with_display_name(display))
            })
            .collect();
            fetcher = fetcher.with_voices(platform, voices);
        }
        fetcher
    }

    pub fn with_voices(mut self, platform: Platform, voices: Vec<VoiceDescriptor>) -> Self {
        self.voices.insert(platform, voices);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl VoiceFetcherPort for StaticVoiceFetcher {
    async fn fetch_voices(&self, platform: Platform) -> Result<Vec<VoiceDescriptor>, CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(CatalogError::fetch_failed(platform, "static source set to fail"));
        }
        self.voices
            .get(&platform)
            .cloned()
            .ok_or(CatalogError::UnsupportedPlatform(platform))
    }
}
