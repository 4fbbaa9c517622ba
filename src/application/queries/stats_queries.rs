//! Stats Queries - 缓存与输出目录统计

/// 音频缓存统计
#[derive(Debug, Clone, Copy, Default)]
pub struct GetCacheStats;

/// 音色目录统计
#[derive(Debug, Clone, Copy, Default)]
pub struct GetCatalogStats;

/// 输出目录中的音频文件
#[derive(Debug, Clone, Copy, Default)]
pub struct ListSavedAudio;
