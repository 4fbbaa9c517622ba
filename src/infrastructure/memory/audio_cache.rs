//! In-Memory Audio Cache Implementation
//!
//! 内容寻址 + TTL + 按字节和条目数双重限制的 LRU

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

use crate::application::ports::{AudioCachePort, CacheStats, Clock, SystemClock};
use crate::domain::synthesis::{CacheKey, SynthesisParams};

/// 音频缓存配置
#[derive(Debug, Clone)]
pub struct AudioCacheConfig {
    /// 最大条目数，0 表示禁用缓存
    pub max_entries: usize,
    /// 最大总字节数
    pub max_size_bytes: u64,
    /// 条目存活时间，0 表示永不过期
    pub ttl: Duration,
}

impl Default for AudioCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 500,
            max_size_bytes: 100 * 1024 * 1024, // 100MB
            ttl: Duration::hours(24),
        }
    }
}

/// 缓存条目（插入后不可变，替换 = 删除 + 插入）
#[derive(Debug)]
struct CacheEntry {
    audio: Vec<u8>,
    size_bytes: u64,
    created_at: DateTime<Utc>,
    text: String,
    params: SynthesisParams,
    /// LRU 序号，插入和命中时刷新
    tick: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<CacheKey, CacheEntry>,
    /// tick -> key，最小的 tick 即 LRU
    order: BTreeMap<u64, CacheKey>,
    next_tick: u64,
    size_bytes: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
    expirations: u64,
}

impl CacheState {
    fn tick(&mut self) -> u64 {
        self.next_tick += 1;
        self.next_tick
    }

    fn remove(&mut self, key: &CacheKey) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.order.remove(&entry.tick);
        self.size_bytes -= entry.size_bytes;
        Some(entry)
    }

    fn touch(&mut self, key: &CacheKey) {
        let tick = self.tick();
        if let Some(entry) = self.entries.get_mut(key) {
            self.order.remove(&entry.tick);
            entry.tick = tick;
            self.order.insert(tick, key.clone());
        }
    }

    fn insert(&mut self, key: CacheKey, mut entry: CacheEntry) {
        let tick = self.tick();
        entry.tick = tick;
        self.size_bytes += entry.size_bytes;
        self.order.insert(tick, key.clone());
        self.entries.insert(key, entry);
    }

    fn sweep_expired(&mut self, now: DateTime<Utc>, ttl: Duration) -> usize {
        let expired: Vec<CacheKey> = self
            .entries
            .iter()
            .filter(|(_, entry)| is_expired(entry, now, ttl))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.remove(key);
        }
        self.expirations += expired.len() as u64;
        expired.len()
    }

    /// 淘汰最久未使用的条目
    fn evict_lru(&mut self) -> bool {
        let Some((_, key)) = self.order.pop_first() else {
            return false;
        };
        if let Some(entry) = self.entries.remove(&key) {
            self.size_bytes -= entry.size_bytes;
            self.evictions += 1;
            tracing::debug!(
                key = %key,
                size_bytes = entry.size_bytes,
                "LRU evicted audio cache entry"
            );
        }
        true
    }
}

fn is_expired(entry: &CacheEntry, now: DateTime<Utc>, ttl: Duration) -> bool {
    ttl > Duration::zero() && now - entry.created_at > ttl
}

/// 内存音频缓存
pub struct InMemoryAudioCache {
    config: AudioCacheConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<CacheState>,
}

impl InMemoryAudioCache {
    pub fn new(config: AudioCacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: AudioCacheConfig, clock: Arc<dyn Clock>) -> Self {
        tracing::info!(
            max_entries = config.max_entries,
            max_size_bytes = config.max_size_bytes,
            ttl_secs = config.ttl.num_seconds(),
            "InMemoryAudioCache initialized"
        );
        Self {
            config,
            clock,
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn config(&self) -> &AudioCacheConfig {
        &self.config
    }

    /// 为新条目腾出空间：先清过期，再按 LRU 淘汰
    fn ensure_space(&self, state: &mut CacheState, incoming: u64, now: DateTime<Utc>) {
        let fits = |s: &CacheState| {
            s.size_bytes + incoming <= self.config.max_size_bytes
                && s.entries.len() < self.config.max_entries
        };

        if fits(state) {
            return;
        }
        state.sweep_expired(now, self.config.ttl);
        while !fits(state) {
            if !state.evict_lru() {
                break;
            }
        }
    }
}

impl AudioCachePort for InMemoryAudioCache {
    fn lookup(&self, text: &str, params: &SynthesisParams) -> Option<Vec<u8>> {
        let key = CacheKey::derive(text, params);
        let now = self.clock.now();
        let mut state = self.state.lock();

        let expired = state
            .entries
            .get(&key)
            .map(|entry| is_expired(entry, now, self.config.ttl));

        match expired {
            None => {
                state.misses += 1;
                tracing::debug!(key = %key, "Audio cache miss");
                None
            }
            Some(true) => {
                state.remove(&key);
                state.expirations += 1;
                state.misses += 1;
                tracing::debug!(key = %key, "Audio cache entry expired");
                None
            }
            Some(false) => {
                state.touch(&key);
                state.hits += 1;
                tracing::debug!(key = %key, "Audio cache hit");
                state.entries.get(&key).map(|entry| entry.audio.clone())
            }
        }
    }

    fn store(&self, text: &str, params: &SynthesisParams, audio: Vec<u8>) {
        let key = CacheKey::derive(text, params);
        let size_bytes = audio.len() as u64;

        if self.config.max_entries == 0 {
            return;
        }
        if size_bytes > self.config.max_size_bytes {
            tracing::debug!(
                key = %key,
                size_bytes = size_bytes,
                max_size_bytes = self.config.max_size_bytes,
                "Audio too large for cache, not stored"
            );
            return;
        }

        let now = self.clock.now();
        let mut state = self.state.lock();

        state.remove(&key);
        self.ensure_space(&mut state, size_bytes, now);
        state.insert(
            key.clone(),
            CacheEntry {
                audio,
                size_bytes,
                created_at: now,
                text: text.to_string(),
                params: params.clone(),
                tick: 0,
            },
        );

        tracing::debug!(
            key = %key,
            size_bytes = size_bytes,
            total_bytes = state.size_bytes,
            entries = state.entries.len(),
            "Audio cached"
        );
    }

    fn contains(&self, text: &str, params: &SynthesisParams) -> bool {
        let key = CacheKey::derive(text, params);
        let now = self.clock.now();
        self.state
            .lock()
            .entries
            .get(&key)
            .map_or(false, |entry| !is_expired(entry, now, self.config.ttl))
    }

    fn invalidate(&self, text: &str, params: &SynthesisParams) {
        let key = CacheKey::derive(text, params);
        if let Some(entry) = self.state.lock().remove(&key) {
            tracing::debug!(
                key = %key,
                voice = %entry.params.voice,
                chars = entry.text.chars().count(),
                "Audio cache entry invalidated"
            );
        }
    }

    fn invalidate_all(&self) {
        let mut state = self.state.lock();
        let count = state.entries.len();
        state.entries.clear();
        state.order.clear();
        state.size_bytes = 0;
        tracing::info!(count = count, "Audio cache cleared");
    }

    fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let removed = self.state.lock().sweep_expired(now, self.config.ttl);
        if removed > 0 {
            tracing::debug!(removed = removed, "Expired audio cache entries swept");
        }
        removed
    }

    fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats {
            hits: state.hits,
            misses: state.misses,
            hit_rate: CacheStats::compute_hit_rate(state.hits, state.misses),
            evictions: state.evictions,
            expirations: state.expirations,
            entry_count: state.entries.len(),
            size_bytes: state.size_bytes,
            max_entries: self.config.max_entries,
            max_size_bytes: self.config.max_size_bytes,
            ttl_secs: self.config.ttl.num_seconds().max(0) as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::ManualClock;

    fn params() -> SynthesisParams {
        SynthesisParams::new("en-US")
    }

    fn cache(max_entries: usize, max_size_bytes: u64) -> InMemoryAudioCache {
        InMemoryAudioCache::new(AudioCacheConfig {
            max_entries,
            max_size_bytes,
            ttl: Duration::hours(1),
        })
    }

    fn clocked(max_entries: usize, clock: Arc<ManualClock>) -> InMemoryAudioCache {
        InMemoryAudioCache::with_clock(
            AudioCacheConfig {
                max_entries,
                max_size_bytes: 1024,
                ttl: Duration::hours(1),
            },
            clock,
        )
    }

    #[test]
    fn test_size_and_count_invariants() {
        let cache = cache(5, 100);
        for i in 0..50u64 {
            let size = (i * 7 % 40 + 1) as usize;
            cache.store(&format!("text {}", i), &params(), vec![0u8; size]);

            let stats = cache.stats();
            assert!(stats.entry_count <= 5);
            assert!(stats.size_bytes <= 100);
        }

        let state = cache.state.lock();
        let sum: u64 = state.entries.values().map(|e| e.size_bytes).sum();
        assert_eq!(state.size_bytes, sum);
        assert_eq!(state.order.len(), state.entries.len());
    }

    #[test]
    fn test_lru_order() {
        let cache = cache(2, 1024);
        let p = params();
        cache.store("A", &p, vec![1]);
        cache.store("B", &p, vec![2]);
        assert_eq!(cache.lookup("A", &p), Some(vec![1]));

        cache.store("C", &p, vec![3]);

        assert!(cache.contains("A", &p));
        assert!(!cache.contains("B", &p));
        assert!(cache.contains("C", &p));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_evicts_by_size() {
        let cache = cache(10, 10);
        let p = params();
        cache.store("A", &p, vec![0; 6]);
        cache.store("B", &p, vec![0; 6]);

        assert!(!cache.contains("A", &p));
        assert!(cache.contains("B", &p));
        assert_eq!(cache.stats().size_bytes, 6);
    }

    #[test]
    fn test_ttl_expiry() {
        let clock = Arc::new(ManualClock::default());
        let cache = clocked(10, clock.clone());
        let p = params();

        cache.store("Hello", &p, vec![1, 2, 3]);
        clock.advance(Duration::minutes(61));

        assert_eq!(cache.lookup("Hello", &p), None);
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.entry_count, 0);
        assert_eq!(stats.size_bytes, 0);
    }

    #[test]
    fn test_expired_entries_go_before_lru() {
        let clock = Arc::new(ManualClock::default());
        let cache = clocked(2, clock.clone());
        let p = params();

        cache.store("A", &p, vec![1]);
        clock.advance(Duration::minutes(30));
        cache.store("B", &p, vec![2]);
        assert!(cache.lookup("A", &p).is_some());

        // A 已过期但最近被访问，B 是 LRU 但未过期
        clock.advance(Duration::minutes(40));
        cache.store("C", &p, vec![3]);

        assert!(cache.contains("B", &p));
        assert!(cache.contains("C", &p));
        let stats = cache.stats();
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.evictions, 0);
    }

    #[test]
    fn test_sweep_expired() {
        let clock = Arc::new(ManualClock::default());
        let cache = clocked(10, clock.clone());
        let p = params();

        cache.store("old", &p, vec![1]);
        clock.advance(Duration::minutes(50));
        cache.store("new", &p, vec![2]);
        clock.advance(Duration::minutes(20));

        assert_eq!(cache.sweep_expired(), 1);
        assert!(cache.contains("new", &p));
        assert_eq!(cache.stats().entry_count, 1);
    }

    #[test]
    fn test_oversized_entry_rejected() {
        let cache = cache(10, 10);
        let p = params();
        cache.store("small", &p, vec![0; 4]);
        cache.store("big", &p, vec![0; 11]);

        assert!(!cache.contains("big", &p));
        assert!(cache.contains("small", &p));
        let stats = cache.stats();
        assert_eq!(stats.entry_count, 1);
        assert_eq!(stats.evictions, 0);
    }

    #[test]
    fn test_whitespace_insensitive_hit() {
        let cache = cache(10, 1024);
        let p = params();
        cache.store("Hello world", &p, vec![9, 9]);

        assert_eq!(cache.lookup("  Hello   world  ", &p), Some(vec![9, 9]));
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.hit_rate, 1.0);
    }

    #[test]
    fn test_store_replaces_existing_key() {
        let cache = cache(10, 1024);
        let p = params();
        cache.store("same", &p, vec![0; 10]);
        cache.store("same", &p, vec![0; 3]);

        let stats = cache.stats();
        assert_eq!(stats.entry_count, 1);
        assert_eq!(stats.size_bytes, 3);
    }

    #[test]
    fn test_params_distinguish_entries() {
        let cache = cache(10, 1024);
        let slow = params().with_rate(0.8);
        cache.store("hi", &slow, vec![1]);

        assert!(cache.lookup("hi", &params()).is_none());
        assert!(cache.lookup("hi", &slow).is_some());
    }

    #[test]
    fn test_invalidate() {
        let cache = cache(10, 1024);
        let p = params();
        cache.store("a", &p, vec![1]);
        cache.store("b", &p, vec![2]);

        cache.invalidate("a", &p);
        cache.invalidate("missing", &p);
        assert!(!cache.contains("a", &p));
        assert_eq!(cache.stats().entry_count, 1);

        cache.invalidate_all();
        let stats = cache.stats();
        assert_eq!(stats.entry_count, 0);
        assert_eq!(stats.size_bytes, 0);
    }

    #[test]
    fn test_zero_max_entries_disables_cache() {
        let cache = cache(0, 1024);
        let p = params();
        cache.store("a", &p, vec![1]);
        assert!(!cache.contains("a", &p));
        assert_eq!(cache.stats().hit_rate, 0.0);
    }
}
