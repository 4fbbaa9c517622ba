//! Configuration Types
//!
//! 定义所有配置结构体

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::application::ports::ConflictPolicy;
use crate::domain::audio::AudioFormat;
use crate::domain::text::TextPreparerConfig;
use crate::domain::voice::Platform;
use crate::infrastructure::memory::{AudioCacheConfig, VoiceCatalogConfig};

/// 应用主配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// TTS 引擎配置
    #[serde(default)]
    pub tts: TtsConfig,

    /// 音色目录配置
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// 音频缓存配置
    #[serde(default)]
    pub cache: CacheConfig,

    /// 文本预处理配置
    #[serde(default)]
    pub text: TextConfig,

    /// 输出目录配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// TTS 引擎配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    /// TTS 服务基础 URL
    #[serde(default = "default_tts_url")]
    pub url: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_tts_timeout")]
    pub timeout_secs: u64,

    /// 最大重试次数
    #[serde(default)]
    pub max_retries: u32,

    /// 默认音色
    #[serde(default = "default_voice")]
    pub voice: String,

    /// 默认输出格式
    #[serde(default)]
    pub format: AudioFormat,

    /// 目标平台，未设置时取当前平台
    #[serde(default)]
    pub platform: Option<Platform>,

    /// 使用本地静音引擎与内置目录，不访问网络
    #[serde(default)]
    pub dry_run: bool,
}

fn default_tts_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_tts_timeout() -> u64 {
    120
}

fn default_voice() -> String {
    "en-US".to_string()
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            url: default_tts_url(),
            timeout_secs: default_tts_timeout(),
            max_retries: 0,
            voice: default_voice(),
            format: AudioFormat::Wav,
            platform: None,
            dry_run: false,
        }
    }
}

impl TtsConfig {
    pub fn platform(&self) -> Platform {
        self.platform.unwrap_or_else(Platform::current)
    }
}

impl AppConfig {
    /// 生效配置的 TOML 表示
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// 音色目录配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// 音色服务 URL，未设置时与 TTS 服务相同
    #[serde(default)]
    pub url: Option<String>,

    /// 拉取超时（秒）
    #[serde(default = "default_catalog_timeout")]
    pub timeout_secs: u64,

    /// 桶的存活时间（秒），0 表示永不过期
    #[serde(default = "default_catalog_ttl")]
    pub ttl_secs: u64,

    /// 最多缓存的平台桶数
    #[serde(default = "default_max_buckets")]
    pub max_buckets: usize,

    /// 后台刷新间隔（秒），0 表示不刷新
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    /// Sled 快照目录
    #[serde(default = "default_catalog_db")]
    pub db_path: PathBuf,
}

fn default_catalog_timeout() -> u64 {
    30
}

fn default_catalog_ttl() -> u64 {
    86400 // 24 小时
}

fn default_max_buckets() -> usize {
    100
}

fn default_refresh_interval() -> u64 {
    43200 // 12 小时
}

fn default_catalog_db() -> PathBuf {
    PathBuf::from("data/catalog")
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: default_catalog_timeout(),
            ttl_secs: default_catalog_ttl(),
            max_buckets: default_max_buckets(),
            refresh_interval_secs: default_refresh_interval(),
            db_path: default_catalog_db(),
        }
    }
}

impl CatalogConfig {
    pub fn cache_config(&self) -> VoiceCatalogConfig {
        VoiceCatalogConfig {
            ttl: chrono::Duration::seconds(self.ttl_secs as i64),
            max_buckets: self.max_buckets,
        }
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        (self.refresh_interval_secs > 0).then(|| Duration::from_secs(self.refresh_interval_secs))
    }
}

/// 音频缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// 最大条目数，0 表示禁用
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// 最大总字节数
    #[serde(default = "default_max_cache_size")]
    pub max_size_bytes: u64,

    /// 条目存活时间（秒），0 表示永不过期
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

fn default_max_entries() -> usize {
    500
}

fn default_max_cache_size() -> u64 {
    100 * 1024 * 1024 // 100 MB
}

fn default_cache_ttl() -> u64 {
    86400
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            max_size_bytes: default_max_cache_size(),
            ttl_secs: default_cache_ttl(),
        }
    }
}

impl CacheConfig {
    pub fn audio_cache_config(&self) -> AudioCacheConfig {
        AudioCacheConfig {
            max_entries: self.max_entries,
            max_size_bytes: self.max_size_bytes,
            ttl: chrono::Duration::seconds(self.ttl_secs as i64),
        }
    }
}

/// 文本预处理配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextConfig {
    #[serde(default = "default_true")]
    pub expand_symbols: bool,

    #[serde(default = "default_true")]
    pub expand_abbreviations: bool,

    /// 覆盖平台字符上限
    #[serde(default)]
    pub max_chars: Option<usize>,

    /// 超长文本分块；关闭时直接报错
    #[serde(default = "default_true")]
    pub chunking: bool,
}

fn default_true() -> bool {
    true
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            expand_symbols: true,
            expand_abbreviations: true,
            max_chars: None,
            chunking: true,
        }
    }
}

impl TextConfig {
    pub fn preparer_config(&self) -> TextPreparerConfig {
        TextPreparerConfig {
            expand_symbols: self.expand_symbols,
            expand_abbreviations: self.expand_abbreviations,
            max_chars_override: self.max_chars,
            ..Default::default()
        }
    }
}

/// 输出目录配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// 音频输出目录
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// 目录配额（字节），0 表示不限制
    #[serde(default)]
    pub quota_bytes: u64,

    /// 文件已存在时的处理方式
    #[serde(default)]
    pub conflict: ConflictPolicy,

    /// 写入后校验
    #[serde(default = "default_true")]
    pub verify: bool,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data/audio")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            quota_bytes: 0,
            conflict: ConflictPolicy::default(),
            verify: true,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.tts.url, "http://localhost:8000");
        assert_eq!(config.tts.format, AudioFormat::Wav);
        assert_eq!(config.cache.max_entries, 500);
        assert_eq!(config.storage.conflict, ConflictPolicy::AutoRename);
        assert!(config.text.chunking);
    }

    #[test]
    fn test_conversions() {
        let config = AppConfig::default();
        let cache = config.cache.audio_cache_config();
        assert_eq!(cache.ttl, chrono::Duration::hours(24));
        assert_eq!(cache.max_size_bytes, 100 * 1024 * 1024);

        let catalog = config.catalog.cache_config();
        assert_eq!(catalog.max_buckets, 100);
        assert_eq!(
            config.catalog.refresh_interval(),
            Some(Duration::from_secs(43200))
        );

        let mut text = TextConfig::default();
        text.max_chars = Some(200);
        assert_eq!(text.preparer_config().max_chars_override, Some(200));
    }

    #[test]
    fn test_to_toml_round_trip() {
        let mut config = AppConfig::default();
        config.tts.platform = Some(Platform::Web);
        let text = config.to_toml().unwrap();
        assert!(text.contains("[storage]"));
        assert!(text.contains("conflict = \"auto-rename\""));

        let parsed: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.tts.platform, Some(Platform::Web));
        assert_eq!(parsed.cache.max_entries, config.cache.max_entries);
    }

    #[test]
    fn test_zero_refresh_interval_disables_refresh() {
        let mut config = CatalogConfig::default();
        config.refresh_interval_secs = 0;
        assert!(config.refresh_interval().is_none());
    }
}
