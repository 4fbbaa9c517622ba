//! Voice Queries - 音色目录查询

use crate::domain::voice::Platform;

/// 列出平台音色
#[derive(Debug, Clone)]
pub struct ListVoices {
    pub platform: Platform,
    /// 语言前缀过滤，如 `en` / `zh-CN`
    pub locale: Option<String>,
    /// 忽略 TTL 强制重新拉取
    pub force_refresh: bool,
}

impl ListVoices {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            locale: None,
            force_refresh: false,
        }
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }
}

/// 按名称查找已缓存的音色
#[derive(Debug, Clone)]
pub struct FindVoice {
    pub platform: Platform,
    pub name: String,
}
