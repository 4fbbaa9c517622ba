//! Audio Cache Port - 合成音频缓存
//!
//! 以 (文本, 参数) 推导出的内容哈希为 key 的 LRU + TTL 缓存。
//! 所有操作都是同步的：实现只持有一把短锁，不做 IO

use serde::Serialize;

use crate::domain::synthesis::{CacheKey, SynthesisParams};

/// 缓存统计信息
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// hits / (hits + misses)，无访问时为 0
    pub hit_rate: f64,
    pub evictions: u64,
    pub expirations: u64,
    pub entry_count: usize,
    pub size_bytes: u64,
    pub max_entries: usize,
    pub max_size_bytes: u64,
    pub ttl_secs: u64,
}

impl CacheStats {
    pub fn compute_hit_rate(hits: u64, misses: u64) -> f64 {
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}

/// Audio Cache Port
///
/// - 查找命中会刷新 LRU 位置并返回数据副本
/// - 超出单条上限的数据静默丢弃
/// - 失效操作从不失败
pub trait AudioCachePort: Send + Sync {
    fn lookup(&self, text: &str, params: &SynthesisParams) -> Option<Vec<u8>>;

    fn store(&self, text: &str, params: &SynthesisParams, audio: Vec<u8>);

    /// 只检查存在性，不计入命中统计，不刷新 LRU
    fn contains(&self, text: &str, params: &SynthesisParams) -> bool;

    fn invalidate(&self, text: &str, params: &SynthesisParams);

    fn invalidate_all(&self);

    /// 清理所有过期条目，返回清理数量
    fn sweep_expired(&self) -> usize;

    fn stats(&self) -> CacheStats;

    fn key_for(&self, text: &str, params: &SynthesisParams) -> CacheKey {
        CacheKey::derive(text, params)
    }
}
