//! Stats Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{
    AudioCachePort, AudioStoragePort, CacheStats, CatalogStats, StoredAudioFile, VoiceCatalogPort,
};
use crate::application::queries::{GetCacheStats, GetCatalogStats, ListSavedAudio};

/// GetCacheStats Handler
pub struct GetCacheStatsHandler {
    cache: Arc<dyn AudioCachePort>,
}

impl GetCacheStatsHandler {
    pub fn new(cache: Arc<dyn AudioCachePort>) -> Self {
        Self { cache }
    }

    pub fn handle(&self, _query: GetCacheStats) -> CacheStats {
        self.cache.stats()
    }
}

/// GetCatalogStats Handler
pub struct GetCatalogStatsHandler {
    catalog: Arc<dyn VoiceCatalogPort>,
}

impl GetCatalogStatsHandler {
    pub fn new(catalog: Arc<dyn VoiceCatalogPort>) -> Self {
        Self { catalog }
    }

    pub fn handle(&self, _query: GetCatalogStats) -> CatalogStats {
        self.catalog.stats()
    }
}

/// ListSavedAudio Handler
pub struct ListSavedAudioHandler {
    storage: Arc<dyn AudioStoragePort>,
}

impl ListSavedAudioHandler {
    pub fn new(storage: Arc<dyn AudioStoragePort>) -> Self {
        Self { storage }
    }

    pub async fn handle(&self, _query: ListSavedAudio) -> Result<Vec<StoredAudioFile>, ApplicationError> {
        Ok(self.storage.list().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::synthesis::SynthesisParams;
    use crate::domain::voice::Platform;
    use crate::infrastructure::adapters::StaticVoiceFetcher;
    use crate::infrastructure::memory::{
        AudioCacheConfig, InMemoryAudioCache, VoiceCatalogCache, VoiceCatalogConfig,
    };

    #[test]
    fn test_cache_stats() {
        let cache = InMemoryAudioCache::new(AudioCacheConfig::default()).arc();
        let params = SynthesisParams::new("en-US");
        cache.store("hello", &params, vec![1, 2, 3]);
        cache.lookup("hello", &params);
        cache.lookup("missing", &params);

        let stats = GetCacheStatsHandler::new(cache).handle(GetCacheStats);
        assert_eq!(stats.entry_count, 1);
        assert_eq!(stats.size_bytes, 3);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 0.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_catalog_stats() {
        let catalog = VoiceCatalogCache::new(
            VoiceCatalogConfig::default(),
            Arc::new(StaticVoiceFetcher::builtin()),
        )
        .arc();
        catalog.get(Platform::Android, false).await.unwrap();
        catalog.get(Platform::Android, false).await.unwrap();

        let stats = GetCatalogStatsHandler::new(catalog).handle(GetCatalogStats);
        assert_eq!(stats.bucket_count, 1);
        assert_eq!(stats.voice_count, 2);
        assert_eq!(stats.fetches, 1);
        assert_eq!(stats.hits, 1);
    }
}
