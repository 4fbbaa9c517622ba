//! Voice Catalog Cache
//!
//! 按平台分桶的音色目录缓存：
//! - TTL 内直接命中；过期或强制刷新时在锁外调用 fetcher
//! - 拉取失败时有旧桶就返回旧桶
//! - 桶数量有上限，先淘汰过期桶，再按 LRU 淘汰
//! - 每次变更后把快照投递给后台持久化任务

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{
    CatalogError, CatalogSnapshot, CatalogStats, CatalogStorePort, Clock, SystemClock,
    VoiceCatalogPort, VoiceFetcherPort,
};
use crate::domain::voice::{Platform, VoiceDescriptor, VoicePlatformBucket};
use crate::infrastructure::worker::{CatalogPersister, PersistHandle};

/// 目录缓存配置
#[derive(Debug, Clone)]
pub struct VoiceCatalogConfig {
    /// 桶的存活时间，0 表示永不过期
    pub ttl: Duration,
    /// 最多缓存的平台桶数
    pub max_buckets: usize,
}

impl Default for VoiceCatalogConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::hours(24),
            max_buckets: 100,
        }
    }
}

/// 后台刷新结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// 已替换，附带音色数量
    Refreshed(usize),
    /// 该平台没有缓存，跳过
    NotCached,
    /// 拉取期间被取消，结果丢弃
    Discarded,
}

#[derive(Debug)]
struct Slot {
    bucket: VoicePlatformBucket,
    tick: u64,
}

#[derive(Debug, Default)]
struct CatalogState {
    slots: HashMap<Platform, Slot>,
    order: BTreeMap<u64, Platform>,
    next_tick: u64,
    hits: u64,
    misses: u64,
    fetches: u64,
    fetch_failures: u64,
    stale_served: u64,
    evictions: u64,
}

impl CatalogState {
    fn tick(&mut self) -> u64 {
        self.next_tick += 1;
        self.next_tick
    }

    fn touch(&mut self, platform: Platform) {
        let tick = self.tick();
        if let Some(slot) = self.slots.get_mut(&platform) {
            self.order.remove(&slot.tick);
            slot.tick = tick;
            self.order.insert(tick, platform);
        }
    }

    fn put(&mut self, platform: Platform, bucket: VoicePlatformBucket) {
        self.remove(platform);
        let tick = self.tick();
        self.order.insert(tick, platform);
        self.slots.insert(platform, Slot { bucket, tick });
    }

    fn remove(&mut self, platform: Platform) -> Option<VoicePlatformBucket> {
        let slot = self.slots.remove(&platform)?;
        self.order.remove(&slot.tick);
        Some(slot.bucket)
    }

    fn snapshot(&self, exported_at: DateTime<Utc>) -> CatalogSnapshot {
        CatalogSnapshot {
            buckets: self
                .slots
                .iter()
                .map(|(platform, slot)| (*platform, slot.bucket.clone()))
                .collect(),
            lru_order: self.order.values().copied().collect(),
            exported_at,
        }
    }
}

/// 音色目录缓存
pub struct VoiceCatalogCache {
    config: VoiceCatalogConfig,
    fetcher: Arc<dyn VoiceFetcherPort>,
    clock: Arc<dyn Clock>,
    state: Mutex<CatalogState>,
    persister: Option<PersistHandle>,
}

impl VoiceCatalogCache {
    pub fn new(config: VoiceCatalogConfig, fetcher: Arc<dyn VoiceFetcherPort>) -> Self {
        Self::with_clock(config, fetcher, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: VoiceCatalogConfig,
        fetcher: Arc<dyn VoiceFetcherPort>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            fetcher,
            clock,
            state: Mutex::new(CatalogState::default()),
            persister: None,
        }
    }

    pub fn with_persister(mut self, persister: PersistHandle) -> Self {
        self.persister = Some(persister);
        self
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 从存储恢复并启动后台持久化
    ///
    /// 快照损坏或读取失败时记录 warn 并以空缓存启动
    pub async fn open(
        config: VoiceCatalogConfig,
        fetcher: Arc<dyn VoiceFetcherPort>,
        clock: Arc<dyn Clock>,
        store: Arc<dyn CatalogStorePort>,
    ) -> Self {
        let snapshot = match store.load().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable catalog snapshot");
                if let Err(e) = store.clear().await {
                    tracing::warn!(error = %e, "Failed to clear catalog snapshot");
                }
                None
            }
        };

        let (handle, _join) = CatalogPersister::spawn(store);
        let cache = Self::with_clock(config, fetcher, clock).with_persister(handle);
        if let Some(snapshot) = snapshot {
            cache.restore(snapshot);
        }

        let stats = cache.stats();
        tracing::info!(
            buckets = stats.bucket_count,
            voices = stats.voice_count,
            max_buckets = stats.max_buckets,
            ttl_secs = stats.ttl_secs,
            "VoiceCatalogCache initialized"
        );
        cache
    }

    /// 用快照替换当前内容（不触发持久化）
    pub fn restore(&self, snapshot: CatalogSnapshot) {
        let CatalogSnapshot {
            mut buckets,
            lru_order,
            ..
        } = snapshot;

        let now = self.clock.now();
        let mut state = self.state.lock();
        state.slots.clear();
        state.order.clear();

        // 不在 lru_order 中的桶视为最旧
        let mut ordered: Vec<(Platform, VoicePlatformBucket)> = Vec::new();
        let listed: Vec<Platform> = lru_order
            .iter()
            .copied()
            .filter(|p| buckets.contains_key(p))
            .collect();
        let unlisted: Vec<Platform> = buckets
            .keys()
            .copied()
            .filter(|p| !listed.contains(p))
            .collect();
        for platform in unlisted.into_iter().chain(listed) {
            if let Some(bucket) = buckets.remove(&platform) {
                ordered.push((platform, bucket));
            }
        }

        for (platform, bucket) in ordered {
            state.put(platform, bucket);
        }
        self.enforce_bound(&mut state, None, now);
    }

    pub fn snapshot(&self) -> CatalogSnapshot {
        self.state.lock().snapshot(self.clock.now())
    }

    /// 等待所有已投递的快照落盘
    pub async fn flush(&self) {
        if let Some(persister) = &self.persister {
            if let Err(e) = persister.flush().await {
                tracing::warn!(error = %e, "Failed to flush catalog persistence");
            }
        }
    }

    /// 落盘并停止后台持久化
    pub async fn shutdown(&self) {
        if let Some(persister) = &self.persister {
            if let Err(e) = persister.shutdown().await {
                tracing::warn!(error = %e, "Failed to shut down catalog persistence");
            }
        }
    }

    /// 只刷新已缓存的平台
    ///
    /// 拉取不会被取消打断；拉取结束时若已取消，结果直接丢弃
    pub async fn refresh_cached(
        &self,
        platform: Platform,
        cancel: &CancellationToken,
    ) -> Result<RefreshOutcome, CatalogError> {
        {
            let mut state = self.state.lock();
            if !state.slots.contains_key(&platform) {
                return Ok(RefreshOutcome::NotCached);
            }
            state.fetches += 1;
        }

        let result = self.fetcher.fetch_voices(platform).await;

        if cancel.is_cancelled() {
            tracing::debug!(platform = %platform, "Refresh cancelled, discarding fetch result");
            return Ok(RefreshOutcome::Discarded);
        }

        match result {
            Ok(voices) => {
                let count = voices.len();
                self.commit(platform, voices);
                Ok(RefreshOutcome::Refreshed(count))
            }
            Err(e) => {
                self.state.lock().fetch_failures += 1;
                Err(e)
            }
        }
    }

    fn is_fresh(&self, bucket: &VoicePlatformBucket, now: DateTime<Utc>) -> bool {
        self.config.ttl <= Duration::zero() || !bucket.is_expired(now, self.config.ttl)
    }

    /// 写入新桶，执行上限并持久化
    fn commit(&self, platform: Platform, voices: Vec<VoiceDescriptor>) {
        let now = self.clock.now();
        let count = voices.len();
        {
            let mut state = self.state.lock();
            state.put(platform, VoicePlatformBucket::new(voices, now));
            self.enforce_bound(&mut state, Some(platform), now);
            self.persist(&state, now);
        }

        tracing::debug!(platform = %platform, voices = count, "Voice catalog bucket replaced");
    }

    /// 先淘汰过期桶，再淘汰 LRU；`keep` 指定的桶不会被淘汰
    fn enforce_bound(&self, state: &mut CatalogState, keep: Option<Platform>, now: DateTime<Utc>) {
        let max = self.config.max_buckets.max(1);
        while state.slots.len() > max {
            let expired = state.order.values().copied().find(|p| {
                Some(*p) != keep
                    && state
                        .slots
                        .get(p)
                        .map_or(false, |slot| !self.is_fresh(&slot.bucket, now))
            });
            let victim =
                expired.or_else(|| state.order.values().copied().find(|p| Some(*p) != keep));

            match victim {
                Some(platform) => {
                    state.remove(platform);
                    state.evictions += 1;
                    tracing::debug!(platform = %platform, "Voice catalog bucket evicted");
                }
                None => break,
            }
        }
    }

    /// 在持锁期间投递，保证队列顺序与变更顺序一致
    fn persist(&self, state: &CatalogState, now: DateTime<Utc>) {
        if let Some(persister) = &self.persister {
            persister.enqueue(state.snapshot(now));
        }
    }
}

#[async_trait]
impl VoiceCatalogPort for VoiceCatalogCache {
    async fn get(
        &self,
        platform: Platform,
        force_refresh: bool,
    ) -> Result<Vec<VoiceDescriptor>, CatalogError> {
        {
            let now = self.clock.now();
            let mut state = self.state.lock();
            let fresh = state
                .slots
                .get(&platform)
                .filter(|slot| !force_refresh && self.is_fresh(&slot.bucket, now))
                .map(|slot| slot.bucket.voices().to_vec());

            if let Some(voices) = fresh {
                state.touch(platform);
                state.hits += 1;
                // LRU 顺序也在快照里
                self.persist(&state, now);
                return Ok(voices);
            }
            state.misses += 1;
            state.fetches += 1;
        }

        tracing::debug!(platform = %platform, force_refresh = force_refresh, "Fetching voice catalog");

        match self.fetcher.fetch_voices(platform).await {
            Ok(voices) => {
                self.commit(platform, voices.clone());
                Ok(voices)
            }
            Err(e) => {
                let mut state = self.state.lock();
                state.fetch_failures += 1;
                let stale = state
                    .slots
                    .get(&platform)
                    .map(|slot| slot.bucket.voices().to_vec());

                match stale {
                    Some(voices) => {
                        state.stale_served += 1;
                        tracing::warn!(
                            platform = %platform,
                            error = %e,
                            "Voice fetch failed, serving stale catalog"
                        );
                        Ok(voices)
                    }
                    None => {
                        tracing::warn!(platform = %platform, error = %e, "Voice fetch failed");
                        Err(e)
                    }
                }
            }
        }
    }

    fn find_voice(&self, platform: Platform, name: &str) -> Option<VoiceDescriptor> {
        self.state
            .lock()
            .slots
            .get(&platform)
            .and_then(|slot| slot.bucket.find(name).cloned())
    }

    fn invalidate(&self, platform: Platform) {
        {
            let mut state = self.state.lock();
            if state.remove(platform).is_none() {
                return;
            }
            self.persist(&state, self.clock.now());
        }
        tracing::debug!(platform = %platform, "Voice catalog bucket invalidated");
    }

    fn invalidate_all(&self) {
        {
            let mut state = self.state.lock();
            state.slots.clear();
            state.order.clear();
            self.persist(&state, self.clock.now());
        }
        tracing::info!("Voice catalog cleared");
    }

    fn stats(&self) -> CatalogStats {
        let state = self.state.lock();
        CatalogStats {
            bucket_count: state.slots.len(),
            voice_count: state.slots.values().map(|s| s.bucket.len()).sum(),
            hits: state.hits,
            misses: state.misses,
            fetches: state.fetches,
            fetch_failures: state.fetch_failures,
            stale_served: state.stale_served,
            evictions: state.evictions,
            max_buckets: self.config.max_buckets,
            ttl_secs: self.config.ttl.num_seconds().max(0) as u64,
        }
    }
}
