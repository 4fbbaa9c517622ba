//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 环境变量前缀
const ENV_PREFIX: &str = "SPEECHCACHE";

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `SPEECHCACHE_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `SPEECHCACHE_TTS__URL=http://tts-server:8000`
/// - `SPEECHCACHE_CACHE__MAX_ENTRIES=1000`
/// - `SPEECHCACHE_STORAGE__OUTPUT_DIR=/data/audio`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("tts.url", "http://localhost:8000")?
        .set_default("tts.timeout_secs", 120)?
        .set_default("tts.max_retries", 0)?
        .set_default("tts.voice", "en-US")?
        .set_default("tts.format", "wav")?
        .set_default("tts.dry_run", false)?
        .set_default("catalog.timeout_secs", 30)?
        .set_default("catalog.ttl_secs", 86400)?
        .set_default("catalog.max_buckets", 100)?
        .set_default("catalog.refresh_interval_secs", 43200)?
        .set_default("catalog.db_path", "data/catalog")?
        .set_default("cache.max_entries", 500)?
        .set_default("cache.max_size_bytes", 100 * 1024 * 1024)?
        .set_default("cache.ttl_secs", 86400)?
        .set_default("text.expand_symbols", true)?
        .set_default("text.expand_abbreviations", true)?
        .set_default("text.chunking", true)?
        .set_default("storage.output_dir", "data/audio")?
        .set_default("storage.quota_bytes", 0)?
        .set_default("storage.conflict", "auto-rename")?
        .set_default("storage.verify", true)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级），变量名会被转换为小写
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if !config.tts.dry_run && config.tts.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "TTS URL cannot be empty".to_string(),
        ));
    }

    if config.tts.voice.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "Default voice cannot be empty".to_string(),
        ));
    }

    if config.catalog.max_buckets == 0 {
        return Err(ConfigError::ValidationError(
            "Catalog max_buckets must be at least 1".to_string(),
        ));
    }

    if config.cache.max_entries > 0 && config.cache.max_size_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "Cache max_size_bytes cannot be 0 when caching is enabled".to_string(),
        ));
    }

    if config.text.max_chars == Some(0) {
        return Err(ConfigError::ValidationError(
            "Text max_chars must be at least 1".to_string(),
        ));
    }

    if config.storage.output_dir.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "Output directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    if config.tts.dry_run {
        tracing::info!("TTS: dry run (silent engine, builtin catalog)");
    } else {
        tracing::info!("TTS URL: {}", config.tts.url);
        tracing::info!("TTS Timeout: {}s", config.tts.timeout_secs);
    }
    tracing::info!("Voice: {} ({})", config.tts.voice, config.tts.format);
    tracing::info!("Platform: {}", config.tts.platform());
    tracing::info!("Catalog DB: {:?}", config.catalog.db_path);
    tracing::info!("Catalog TTL: {}s", config.catalog.ttl_secs);
    tracing::info!("Catalog Refresh: {}s", config.catalog.refresh_interval_secs);
    tracing::info!(
        "Audio Cache: {} entries / {} bytes, TTL {}s",
        config.cache.max_entries,
        config.cache.max_size_bytes,
        config.cache.ttl_secs
    );
    tracing::info!("Output Directory: {:?}", config.storage.output_dir);
    if config.storage.quota_bytes > 0 {
        tracing::info!("Output Quota: {} bytes", config.storage.quota_bytes);
    }
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
