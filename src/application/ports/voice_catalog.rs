//! Voice Catalog Ports - 音色目录的拉取与持久化

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::voice::{Platform, VoiceDescriptor, VoicePlatformBucket};

/// 目录错误
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to fetch voices for {platform}: {reason}")]
    FetchFailed { platform: Platform, reason: String },

    #[error("Platform not supported by voice source: {0}")]
    UnsupportedPlatform(Platform),
}

impl CatalogError {
    pub fn fetch_failed(platform: Platform, reason: impl Into<String>) -> Self {
        Self::FetchFailed {
            platform,
            reason: reason.into(),
        }
    }
}

/// 持久化错误（记录 warn 后吞掉）
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Corrupt snapshot: {0}")]
    Corrupt(String),

    #[error("Persister is closed")]
    Closed,
}

/// 目录快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub buckets: BTreeMap<Platform, VoicePlatformBucket>,
    /// LRU 在前，MRU 在后
    pub lru_order: Vec<Platform>,
    pub exported_at: DateTime<Utc>,
}

impl CatalogSnapshot {
    pub fn empty(exported_at: DateTime<Utc>) -> Self {
        Self {
            buckets: BTreeMap::new(),
            lru_order: Vec::new(),
            exported_at,
        }
    }
}

/// 音色来源
#[async_trait]
pub trait VoiceFetcherPort: Send + Sync {
    async fn fetch_voices(&self, platform: Platform) -> Result<Vec<VoiceDescriptor>, CatalogError>;
}

/// 快照存储
#[async_trait]
pub trait CatalogStorePort: Send + Sync {
    /// 读取快照；不存在返回 `None`
    async fn load(&self) -> Result<Option<CatalogSnapshot>, PersistenceError>;

    async fn save(&self, snapshot: &CatalogSnapshot) -> Result<(), PersistenceError>;

    async fn clear(&self) -> Result<(), PersistenceError>;
}

/// 目录统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub bucket_count: usize,
    pub voice_count: usize,
    pub hits: u64,
    pub misses: u64,
    pub fetches: u64,
    pub fetch_failures: u64,
    pub stale_served: u64,
    pub evictions: u64,
    pub max_buckets: usize,
    pub ttl_secs: u64,
}

/// 按平台缓存的音色目录
#[async_trait]
pub trait VoiceCatalogPort: Send + Sync {
    /// 新鲜则直接返回；否则拉取，失败时退回过期数据
    async fn get(
        &self,
        platform: Platform,
        force_refresh: bool,
    ) -> Result<Vec<VoiceDescriptor>, CatalogError>;

    /// 按语言前缀过滤（不区分大小写）
    async fn voices_for_locale(
        &self,
        platform: Platform,
        locale: &str,
    ) -> Result<Vec<VoiceDescriptor>, CatalogError> {
        let voices = self.get(platform, false).await?;
        Ok(voices
            .into_iter()
            .filter(|v| v.matches_locale(locale))
            .collect())
    }

    /// 只查已缓存的桶，不触发拉取
    fn find_voice(&self, platform: Platform, name: &str) -> Option<VoiceDescriptor>;

    fn invalidate(&self, platform: Platform);

    fn invalidate_all(&self);

    fn stats(&self) -> CatalogStats;
}
